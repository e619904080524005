//! Mount and unmount against a bookkeeping host, with a canvas that only
//! records what it was asked to draw.

use backdrop::error::RenderError;
use backdrop::prelude::*;
use backdrop::scheduler::SchedulerStats;
use std::cell::Cell;
use std::rc::Rc;

/// Canvas double: counts draws and fails on demand.
struct RecordingCanvas {
    viewport: Viewport,
    draws: u32,
    fail_on: Option<u32>,
    released: Rc<Cell<bool>>,
}

impl RecordingCanvas {
    fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            draws: 0,
            fail_on: None,
            released: Rc::new(Cell::new(false)),
        }
    }

    fn failing_on(mut self, draw: u32) -> Self {
        self.fail_on = Some(draw);
        self
    }
}

impl<E: Effect> Canvas<E> for RecordingCanvas {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn draw(&mut self, effect: &E) -> Result<DrawStats, RenderError> {
        self.draws += 1;
        if self.fail_on == Some(self.draws) {
            return Err(RenderError::OutOfMemory);
        }
        Ok(DrawStats {
            instances: effect.instance_count(),
        })
    }

    fn release(&mut self) {
        self.released.set(true);
    }
}

fn region() -> Viewport {
    Viewport::new(1280, 720)
}

fn mount_particles(
    host: &mut FrameScheduler,
    config: ParticleFieldConfig,
) -> Mount<ParticleField, RecordingCanvas> {
    let field = ParticleField::new(config, region());
    Mount::attach(host, field, |_| Ok::<_, MountError>(RecordingCanvas::new(region()))).unwrap()
}

#[test]
fn test_attach_then_detach_leaves_nothing() {
    let mut host = FrameScheduler::new();
    let mount = mount_particles(&mut host, ParticleFieldConfig::default().with_count(10).with_seed(1));

    assert_eq!(host.pending_frames(), 1);
    assert!(host.is_listening(mount.id(), ListenerKind::Resize));
    assert!(host.is_listening(mount.id(), ListenerKind::PointerMove));

    mount.detach(&mut host);

    assert_eq!(host.pending_frames(), 0);
    assert_eq!(host.active_listeners(), 0);
}

#[test]
fn test_detach_after_frames() {
    let mut host = FrameScheduler::new();
    let mut mount = mount_particles(&mut host, ParticleFieldConfig::default().with_count(5).with_seed(2));
    let id = mount.id();

    for i in 0..10u64 {
        assert!(host.take_frame(id).is_some());
        mount.frame(&mut host, std::time::Duration::from_millis(16 * i));
    }
    assert_eq!(host.pending_frames(), 1);

    mount.detach(&mut host);
    let stats: SchedulerStats = host.stats();
    assert_eq!(host.pending_frames(), 0);
    assert_eq!(stats.frames_requested, 11);
    assert_eq!(stats.frames_fired, 10);
    assert_eq!(stats.frames_cancelled, 1);
    assert_eq!(stats.listeners_attached, stats.listeners_detached);
}

#[test]
fn test_failed_setup_registers_nothing() {
    let mut host = FrameScheduler::new();
    let field = Starfield::new(StarfieldConfig::default(), region());

    let result: Result<Mount<Starfield, RecordingCanvas>, &str> =
        Mount::attach(&mut host, field, |_| Err("no adapter"));

    assert!(result.is_err());
    assert_eq!(host.pending_frames(), 0);
    assert_eq!(host.active_listeners(), 0);
    assert_eq!(host.stats(), SchedulerStats::default());
}

#[test]
fn test_zero_entities_draw_nothing() {
    let mut host = FrameScheduler::new();
    let mut mount = mount_particles(&mut host, ParticleFieldConfig::default().with_count(0));
    let id = mount.id();

    host.take_frame(id);
    let stats = mount.frame(&mut host, std::time::Duration::ZERO);
    assert_eq!(stats, Some(DrawStats { instances: 0 }));
    assert!(!mount.is_halted());

    let field = AttractionField::new(AttractionConfig::default().with_count(0), region());
    let mut mount = Mount::attach(&mut host, field, |_| {
        Ok::<_, MountError>(RecordingCanvas::new(region()))
    })
    .unwrap();
    host.take_frame(mount.id());
    assert_eq!(
        mount.frame(&mut host, std::time::Duration::ZERO),
        Some(DrawStats { instances: 0 })
    );
}

#[test]
fn test_draw_error_halts_and_cancels() {
    let mut host = FrameScheduler::new();
    let field = Starfield::new(StarfieldConfig::default(), region());
    let mut mount = Mount::attach(&mut host, field, |_| {
        Ok::<_, MountError>(RecordingCanvas::new(region()).failing_on(2))
    })
    .unwrap();
    let id = mount.id();

    host.take_frame(id);
    assert!(mount.frame(&mut host, std::time::Duration::ZERO).is_some());
    host.take_frame(id);
    assert!(mount.frame(&mut host, std::time::Duration::from_millis(16)).is_none());

    assert!(mount.is_halted());
    assert!(!host.has_pending(id));
    // Listeners stay until the mount is detached
    assert!(host.is_listening(id, ListenerKind::Resize));

    // Halted mounts ignore further callbacks
    assert!(mount.frame(&mut host, std::time::Duration::from_millis(32)).is_none());
    assert_eq!(mount.canvas().draws, 2);

    mount.detach(&mut host);
    assert_eq!(host.active_listeners(), 0);
}

#[test]
fn test_detach_releases_canvas() {
    let mut host = FrameScheduler::new();
    let field = Starfield::new(StarfieldConfig::default(), region());
    let canvas = RecordingCanvas::new(region());
    let released = Rc::clone(&canvas.released);
    let mount = Mount::attach(&mut host, field, |_| Ok::<_, MountError>(canvas)).unwrap();
    assert!(!released.get());

    let field = mount.detach(&mut host);
    assert!(released.get());
    assert_eq!(field.name(), "starfield");
}

#[test]
fn test_hover_disabled_skips_pointer_listener() {
    let mut host = FrameScheduler::new();
    let config = ParticleFieldConfig::default()
        .with_count(3)
        .with_hover(false, 0.0);
    let mount = mount_particles(&mut host, config);

    assert!(!host.is_listening(mount.id(), ListenerKind::PointerMove));
    assert!(host.is_listening(mount.id(), ListenerKind::Resize));
    assert_eq!(host.active_listeners(), 1);
}

#[test]
fn test_empty_resize_is_skipped() {
    let mut host = FrameScheduler::new();
    let mut mount = mount_particles(&mut host, ParticleFieldConfig::default().with_count(3));

    mount.resized(Viewport::new(0, 400));
    assert_eq!(mount.canvas().viewport, region());
    assert_eq!(mount.effect().viewport(), region());

    mount.resized(Viewport::new(800, 400));
    assert_eq!(mount.canvas().viewport, Viewport::new(800, 400));
    assert_eq!(mount.effect().viewport(), Viewport::new(800, 400));
}

#[test]
fn test_layers_are_independent() {
    let mut host = FrameScheduler::new();
    let a = mount_particles(&mut host, ParticleFieldConfig::default().with_count(3));
    let b = mount_particles(&mut host, ParticleFieldConfig::default().with_count(4));
    assert_ne!(a.id(), b.id());

    let layers: Vec<Box<dyn Layer>> = vec![Box::new(a), Box::new(b)];
    assert_eq!(host.pending_frames(), 2);

    let mut layers = layers.into_iter();
    let first = layers.next().unwrap();
    let first_id = first.id();
    first.detach(&mut host);

    assert!(!host.has_pending(first_id));
    assert_eq!(host.pending_frames(), 1);
    assert_eq!(host.active_listeners(), 2);
}

#[test]
fn test_unfired_frames_are_replaced_not_leaked() {
    let mut host = FrameScheduler::new();
    let field = Starfield::new(StarfieldConfig::default(), region());
    let mut mount = Mount::attach(&mut host, field, |_| {
        Ok::<_, MountError>(RecordingCanvas::new(region()))
    })
    .unwrap();

    // Callbacks run without the host consuming the pending frame first
    mount.frame(&mut host, std::time::Duration::ZERO);
    mount.frame(&mut host, std::time::Duration::from_millis(16));
    assert_eq!(host.pending_frames(), 1);

    mount.detach(&mut host);
    assert_eq!(host.pending_frames(), 0);
    assert_eq!(host.stats().frames_cancelled, 3);
}

#[test]
fn test_layer_reports_clock_fps() {
    let mut host = FrameScheduler::new();
    let mount = mount_particles(&mut host, ParticleFieldConfig::default().with_count(2));
    let mut layer: Box<dyn Layer> = Box::new(mount);
    assert_eq!(layer.fps(), 0.0);

    let id = layer.id();
    for i in 0..61u32 {
        assert!(host.take_frame(id).is_some());
        layer.frame(&mut host, std::time::Duration::from_micros(16_667) * i);
    }
    let fps = layer.fps();
    assert!(fps > 55.0 && fps < 65.0, "fps {fps}");

    layer.detach(&mut host);
}

//! End-to-end runs of each engine on the CPU, driven by a frame host the
//! way the stage drives them.

use std::time::Duration;

use backdrop::attraction::Capsule;
use backdrop::error::RenderError;
use backdrop::input::PointerTracker;
use backdrop::prelude::*;
use backdrop::starfield::shade;

/// Canvas that draws nothing and reports the effect's instance count.
struct NullCanvas(Viewport);

impl<E: Effect> Canvas<E> for NullCanvas {
    fn viewport(&self) -> Viewport {
        self.0
    }

    fn resize(&mut self, viewport: Viewport) {
        self.0 = viewport;
    }

    fn draw(&mut self, effect: &E) -> Result<DrawStats, RenderError> {
        Ok(DrawStats {
            instances: effect.instance_count(),
        })
    }
}

const FRAME: Duration = Duration::from_micros(16_667);

/// Fire `frames` callbacks at 60 Hz.
fn run<E: Effect>(host: &mut FrameScheduler, mount: &mut Mount<E, NullCanvas>, frames: u32) {
    for i in 0..frames {
        assert!(host.take_frame(mount.id()).is_some());
        mount.frame(host, FRAME * i);
    }
}

#[test]
fn test_particle_field_stays_finite() {
    let viewport = Viewport::new(1280, 720);
    let config = ParticleFieldConfig::default()
        .with_count(800)
        .with_spread(25.0)
        .with_seed(42);
    let field = ParticleField::new(config, viewport);

    let mut host = FrameScheduler::new();
    let mut mount = Mount::attach(&mut host, field, |_| Ok::<_, MountError>(NullCanvas(viewport))).unwrap();

    mount.pointer_moved(Vec2::new(900.0, 200.0));
    run(&mut host, &mut mount, 100);

    let field = mount.effect();
    assert_eq!(field.instance_count(), 800);
    assert!(field.time().elapsed() > 0.0);
    for p in field.particles() {
        assert!(p.home.length() <= 25.0 + 1e-3);
        assert!(field.displaced_position(p).is_finite(), "{:?}", p);
        let size = field.point_size(p);
        assert!(size.is_finite() && size >= 0.0, "size {size} for {p:?}");
    }

    mount.detach(&mut host);
    assert_eq!(host.pending_frames(), 0);
    assert_eq!(host.active_listeners(), 0);
}

#[test]
fn test_attraction_converges_onto_ring() {
    let viewport = Viewport::new(1280, 720);
    let config = AttractionConfig::default();
    let ring = config.ring_radius;
    let wobble = config.wave_amplitude;

    let capsule = Capsule::new(Vec3::new(10.0, 0.0, 0.0), 0.0, 0.01);
    let field = AttractionField::from_capsules(config, viewport, vec![capsule]);

    let mut host = FrameScheduler::new();
    let mut mount = Mount::attach(&mut host, field, |_| Ok::<_, MountError>(NullCanvas(viewport))).unwrap();

    // Centre of the region is the world origin
    mount.pointer_moved(Vec2::new(640.0, 360.0));
    assert!(mount.effect().pointer_world().length() < 1e-4);

    run(&mut host, &mut mount, 300);

    let capsule = &mount.effect().capsules()[0];
    let dist = capsule.current.truncate().length();
    assert!(
        (dist - ring).abs() <= wobble + 1e-3,
        "distance {dist} not within {wobble} of {ring}"
    );
}

#[test]
fn test_attraction_release_returns_home() {
    let viewport = Viewport::new(1280, 720);
    let home = Vec3::new(10.0, 0.0, 0.0);
    let field = AttractionField::from_capsules(
        AttractionConfig::default(),
        viewport,
        vec![Capsule::new(home, 0.0, 0.01)],
    );

    let mut host = FrameScheduler::new();
    let mut mount = Mount::attach(&mut host, field, |_| Ok::<_, MountError>(NullCanvas(viewport))).unwrap();

    mount.pointer_moved(Vec2::new(640.0, 360.0));
    run(&mut host, &mut mount, 200);
    // Far corner: well outside the magnet radius
    mount.pointer_moved(Vec2::new(0.0, 0.0));
    run(&mut host, &mut mount, 300);

    let capsule = &mount.effect().capsules()[0];
    assert!((capsule.current - home).length() < 1e-3);
}

#[test]
fn test_pointer_easing_bound() {
    let start = Vec2::new(0.5, 0.5);
    let target = Vec2::new(0.9, 0.1);
    let alpha = 0.1;

    let mut tracker = PointerTracker::new(start, alpha);
    tracker.set_target(target);

    for k in 1..=30 {
        let eased = tracker.step();
        let expected = target - (target - start) * (1.0 - alpha).powi(k);
        assert!((eased - expected).length() < 1e-5, "frame {k}");
    }

    let frames = tracker.frames_to_settle(1e-3).unwrap();
    let mut tracker = PointerTracker::new(start, alpha);
    tracker.set_target(target);
    for _ in 0..frames {
        tracker.step();
    }
    assert!((tracker.position() - target).length() <= (target - start).length() * 1e-3 + 1e-6);
}

#[test]
fn test_starfield_frames_render_finite_pixels() {
    let viewport = Viewport::new(320, 240);
    let field = Starfield::new(StarfieldConfig::default(), viewport);

    let mut host = FrameScheduler::new();
    let mut mount = Mount::attach(&mut host, field, |_| Ok::<_, MountError>(NullCanvas(viewport))).unwrap();

    for i in 0..30 {
        mount.pointer_moved(Vec2::new(100.0 + i as f32 * 4.0, 120.0));
        assert!(host.take_frame(mount.id()).is_some());
        mount.frame(&mut host, FRAME * i);
    }

    let uniforms = *mount.effect().uniforms();
    assert!(uniforms.mouse_active_factor > 0.0);
    for y in 0..12 {
        for x in 0..16 {
            let uv = Vec2::new((x as f32 + 0.5) / 16.0, (y as f32 + 0.5) / 12.0);
            let pixel = shade(uv, &uniforms);
            assert!(pixel.is_finite(), "pixel at {uv} is {pixel}");
            assert!(pixel.min_element() >= 0.0);
        }
    }
}

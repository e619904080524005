//! The windowed host: one window per scene layer, all sharing one GPU device.
//!
//! The stage owns the [`FrameScheduler`] every layer is mounted on. Frame
//! callbacks are fired from `RedrawRequested`; a layer only gets another
//! redraw while it has a frame pending, so a halted or detached layer goes
//! quiet on its own.
//! Pointer and resize events are delivered only to layers listening for
//! them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::attraction::AttractionField;
use crate::effect::{Canvas, Effect};
use crate::error::{GpuError, MountError, StageError};
use crate::gpu::{CapsuleCanvas, GpuContext, PointCanvas, StarfieldCanvas, SurfaceTarget};
use crate::input::Viewport;
use crate::mount::{Layer, Mount};
use crate::particles::ParticleField;
use crate::scene::{LayerConfig, SceneConfig};
use crate::scheduler::{FrameScheduler, ListenerKind};
use crate::starfield::Starfield;

/// Runs a [`SceneConfig`] until every window is closed.
pub struct Stage {
    scene: SceneConfig,
}

impl Stage {
    pub fn new(scene: SceneConfig) -> Self {
        Self { scene }
    }

    /// Open the windows and block until they are all closed.
    ///
    /// Fails with [`StageError::NothingMounted`] if no layer could be
    /// mounted.
    pub fn run(self) -> Result<(), StageError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = StageApp::new(self.scene);
        event_loop.run_app(&mut app)?;

        if app.mounted == 0 {
            return Err(StageError::NothingMounted);
        }
        Ok(())
    }
}

/// A mounted layer and the window it draws into.
struct Slot {
    window: Arc<Window>,
    layer: Box<dyn Layer>,
    title: String,
    shown_fps: f32,
}

impl Slot {
    /// Put the layer clock's frame rate in the title whenever it changes.
    fn report_fps(&mut self) {
        let fps = self.layer.fps();
        if fps > 0.0 && fps != self.shown_fps {
            log::debug!("{}: {:.1} fps", self.layer.name(), fps);
            self.window.set_title(&format!("{} ({:.0} fps)", self.title, fps));
            self.shown_fps = fps;
        }
    }
}

struct StageApp {
    scene: SceneConfig,
    started: Instant,
    gpu: Option<Arc<GpuContext>>,
    scheduler: FrameScheduler,
    slots: HashMap<WindowId, Slot>,
    initialised: bool,
    mounted: usize,
}

impl StageApp {
    fn new(scene: SceneConfig) -> Self {
        Self {
            scene,
            started: Instant::now(),
            gpu: None,
            scheduler: FrameScheduler::new(),
            slots: HashMap::new(),
            initialised: false,
            mounted: 0,
        }
    }

    fn open_layer(&mut self, event_loop: &ActiveEventLoop, config: &LayerConfig) -> Result<Slot, MountError> {
        let title = format!("{} - {}", self.scene.title, config.kind());
        let attrs = Window::default_attributes()
            .with_title(title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(self.scene.width, self.scene.height))
            .with_transparent(true);
        let window = Arc::new(event_loop.create_window(attrs)?);
        let viewport = Viewport::from(window.inner_size());

        let host = &mut self.scheduler;
        let gpu = &mut self.gpu;
        let layer = match config {
            LayerConfig::Particles(c) => mount(
                host,
                gpu,
                &window,
                ParticleField::new(c.clone(), viewport),
                PointCanvas::new,
            )?,
            LayerConfig::Starfield(c) => mount(
                host,
                gpu,
                &window,
                Starfield::new(c.clone(), viewport),
                StarfieldCanvas::new,
            )?,
            LayerConfig::Attraction(c) => mount(
                host,
                gpu,
                &window,
                AttractionField::new(c.clone(), viewport),
                CapsuleCanvas::new,
            )?,
        };

        window.request_redraw();
        Ok(Slot {
            window,
            layer,
            title,
            shown_fps: 0.0,
        })
    }

    fn close(&mut self, id: WindowId) {
        if let Some(slot) = self.slots.remove(&id) {
            slot.layer.detach(&mut self.scheduler);
        }
    }
}

/// Create a surface for `window`, creating the shared device on first use.
fn open_target(gpu: &mut Option<Arc<GpuContext>>, window: Arc<Window>) -> Result<SurfaceTarget, GpuError> {
    let (context, surface) = match gpu {
        Some(context) => (context.clone(), context.create_surface(window.clone())?),
        None => {
            let (context, surface) = pollster::block_on(GpuContext::new(window.clone()))?;
            let context = Arc::new(context);
            *gpu = Some(context.clone());
            (context, surface)
        }
    };
    SurfaceTarget::new(context, window, surface)
}

fn mount<E, C>(
    host: &mut FrameScheduler,
    gpu: &mut Option<Arc<GpuContext>>,
    window: &Arc<Window>,
    effect: E,
    canvas: fn(SurfaceTarget, &E) -> C,
) -> Result<Box<dyn Layer>, MountError>
where
    E: Effect + 'static,
    C: Canvas<E> + 'static,
{
    let mount = Mount::attach(host, effect, |effect| -> Result<C, MountError> {
        let target = open_target(gpu, window.clone())?;
        Ok(canvas(target, effect))
    })?;
    Ok(Box::new(mount))
}

impl ApplicationHandler for StageApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.initialised {
            return;
        }
        self.initialised = true;

        let layers = self.scene.layers.clone();
        for config in &layers {
            match self.open_layer(event_loop, config) {
                Ok(slot) => {
                    self.slots.insert(slot.window.id(), slot);
                    self.mounted += 1;
                }
                Err(err) => log::warn!("Failed to mount {}: {}", config.kind(), err),
            }
        }

        if self.slots.is_empty() {
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.close(id);
                if self.slots.is_empty() {
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(slot) = self.slots.get_mut(&id) {
                    if self.scheduler.is_listening(slot.layer.id(), ListenerKind::Resize) {
                        slot.layer.resized(Viewport::from(size));
                        slot.window.request_redraw();
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(slot) = self.slots.get_mut(&id) {
                    if self.scheduler.is_listening(slot.layer.id(), ListenerKind::PointerMove) {
                        slot.layer
                            .pointer_moved(Vec2::new(position.x as f32, position.y as f32));
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(slot) = self.slots.get_mut(&id) else {
                    return;
                };
                let owner = slot.layer.id();
                if self.scheduler.take_frame(owner).is_none() {
                    return;
                }

                let timestamp = self.started.elapsed();
                if slot.layer.frame(&mut self.scheduler, timestamp).is_some() {
                    slot.report_fps();
                }
                if self.scheduler.has_pending(owner) {
                    slot.window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

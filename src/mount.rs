//! Mounting an effect into a display region.
//!
//! A [`Mount`] owns one effect, the canvas drawing it and every handle it
//! holds on the frame host. Mounting runs the canvas setup first and only
//! then registers listeners and the first frame, so a failed setup leaves
//! nothing behind. Detaching releases everything in reverse.

use crate::effect::{Canvas, DrawStats, Effect};
use crate::input::Viewport;
use crate::scheduler::{FrameHandle, FrameHost, LayerId, ListenerHandle, ListenerKind};
use glam::Vec2;
use std::time::Duration;

/// A mounted effect and its canvas.
pub struct Mount<E: Effect, C: Canvas<E>> {
    id: LayerId,
    effect: E,
    canvas: C,
    frame: Option<FrameHandle>,
    listeners: Vec<ListenerHandle>,
    last_timestamp: Option<Duration>,
    halted: bool,
}

impl<E: Effect, C: Canvas<E>> Mount<E, C> {
    /// Mount `effect` with the canvas built by `setup`.
    ///
    /// On error nothing is registered with `host`.
    pub fn attach<F, Err>(host: &mut dyn FrameHost, mut effect: E, setup: F) -> Result<Self, Err>
    where
        F: FnOnce(&E) -> Result<C, Err>,
    {
        let canvas = setup(&effect)?;

        let viewport = canvas.viewport();
        if !viewport.is_empty() {
            effect.resize(viewport);
        }

        let id = host.allocate_id();
        let mut listeners = vec![host.listen(id, ListenerKind::Resize)];
        if effect.listens_to_pointer() {
            listeners.push(host.listen(id, ListenerKind::PointerMove));
        }
        let frame = Some(host.request_frame(id));

        log::info!(
            "Mounted {} ({} instances, {}x{})",
            effect.name(),
            effect.instance_count(),
            viewport.width,
            viewport.height
        );

        Ok(Self {
            id,
            effect,
            canvas,
            frame,
            listeners,
            last_timestamp: None,
            halted: false,
        })
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn effect(&self) -> &E {
        &self.effect
    }

    pub fn effect_mut(&mut self) -> &mut E {
        &mut self.effect
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    /// Whether rendering stopped after a draw error.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Run one frame callback at `timestamp` (time since the host started).
    ///
    /// The next frame is requested before any work is done. The first frame
    /// advances the clock by zero. Returns `None` once the mount has halted.
    pub fn frame(&mut self, host: &mut dyn FrameHost, timestamp: Duration) -> Option<DrawStats> {
        if self.halted {
            return None;
        }
        if let Some(stale) = self.frame.replace(host.request_frame(self.id)) {
            host.cancel_frame(stale);
        }

        let delta = match self.last_timestamp {
            Some(last) => timestamp.saturating_sub(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp);

        self.effect.update(delta);

        match self.canvas.draw(&self.effect) {
            Ok(stats) => Some(stats),
            Err(err) => {
                log::warn!("{} stopped rendering: {}", self.effect.name(), err);
                if let Some(frame) = self.frame.take() {
                    host.cancel_frame(frame);
                }
                self.halted = true;
                None
            }
        }
    }

    /// Deliver a pointer move, in region pixels.
    pub fn pointer_moved(&mut self, position: Vec2) {
        self.effect.pointer_moved(position);
    }

    /// Deliver a resize. Empty regions are skipped until the next event.
    pub fn resized(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            log::debug!(
                "Skipping resize of {} to {}x{}",
                self.effect.name(),
                viewport.width,
                viewport.height
            );
            return;
        }
        self.canvas.resize(viewport);
        self.effect.resize(viewport);
    }

    /// Unmount: cancel the pending frame, detach listeners, release the canvas.
    pub fn detach(mut self, host: &mut dyn FrameHost) -> E {
        if let Some(frame) = self.frame.take() {
            host.cancel_frame(frame);
        }
        for listener in self.listeners.drain(..) {
            host.unlisten(listener);
        }
        self.canvas.release();

        log::info!("Unmounted {}", self.effect.name());
        self.effect
    }
}

/// Object-safe view of a mount, used by the stage to hold mixed effects.
pub trait Layer {
    fn id(&self) -> LayerId;

    fn name(&self) -> &'static str;

    fn is_halted(&self) -> bool;

    /// Frame rate measured by the effect's clock.
    fn fps(&self) -> f32;

    fn frame(&mut self, host: &mut dyn FrameHost, timestamp: Duration) -> Option<DrawStats>;

    fn pointer_moved(&mut self, position: Vec2);

    fn resized(&mut self, viewport: Viewport);

    fn detach(self: Box<Self>, host: &mut dyn FrameHost);
}

impl<E: Effect, C: Canvas<E>> Layer for Mount<E, C> {
    fn id(&self) -> LayerId {
        self.id
    }

    fn name(&self) -> &'static str {
        self.effect.name()
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn fps(&self) -> f32 {
        self.effect.time().fps()
    }

    fn frame(&mut self, host: &mut dyn FrameHost, timestamp: Duration) -> Option<DrawStats> {
        Mount::frame(self, host, timestamp)
    }

    fn pointer_moved(&mut self, position: Vec2) {
        Mount::pointer_moved(self, position)
    }

    fn resized(&mut self, viewport: Viewport) {
        Mount::resized(self, viewport)
    }

    fn detach(self: Box<Self>, host: &mut dyn FrameHost) {
        Mount::detach(*self, host);
    }
}

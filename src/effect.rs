//! The seams between an animated effect, its GPU backend and its host.
//!
//! An [`Effect`] is pure simulation: it owns its clock, pointer state and
//! entity pool and knows nothing about GPUs or windows. A [`Canvas`] draws
//! one effect into one display region. [`crate::mount::Mount`] glues the two
//! to a frame host.

use crate::error::RenderError;
use crate::input::Viewport;
use crate::time::Time;
use glam::Vec2;

/// A frame-driven backdrop simulation.
pub trait Effect {
    /// Short name used in logs and window titles.
    fn name(&self) -> &'static str;

    /// Whether pointer-move events should be delivered at all.
    fn listens_to_pointer(&self) -> bool {
        true
    }

    /// The display region changed size. Never called with an empty viewport.
    fn resize(&mut self, viewport: Viewport);

    /// The pointer moved to `position`, in region pixels (origin top-left).
    fn pointer_moved(&mut self, position: Vec2);

    /// Advance by `delta` seconds of wall time.
    fn update(&mut self, delta: f32);

    /// The effect's clock, advanced once per [`update`](Self::update).
    fn time(&self) -> &Time;

    /// Number of instances the next draw will submit.
    fn instance_count(&self) -> u32;
}

/// What a single draw submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub instances: u32,
}

/// Draws one kind of effect into a display region.
///
/// Transient surface conditions are handled inside [`draw`](Self::draw);
/// an `Err` means the canvas cannot continue.
pub trait Canvas<E: Effect> {
    /// Current size of the region being drawn to.
    fn viewport(&self) -> Viewport;

    /// Resize backing resources. Never called with an empty viewport.
    fn resize(&mut self, viewport: Viewport);

    fn draw(&mut self, effect: &E) -> Result<DrawStats, RenderError>;

    /// Release GPU resources. Called once, after every listener is detached.
    fn release(&mut self) {}
}

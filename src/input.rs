//! Pointer handling for backdrop effects.
//!
//! Effects only react to the pointer position. [`Pointer`] turns raw window
//! pixel positions into the coordinate spaces the engines use, and
//! [`PointerTracker`] eases a value toward the latest pointer target once per
//! frame so the effect never jumps with the cursor.
//!
//! # Usage
//!
//! ```
//! use backdrop::input::{Pointer, PointerTracker, Viewport};
//! use backdrop::Vec2;
//!
//! let mut pointer = Pointer::new(Viewport::new(800, 600));
//! pointer.move_to(Vec2::new(400.0, 300.0));
//! assert_eq!(pointer.ndc(), Vec2::ZERO);
//!
//! let mut tracker = PointerTracker::new(Vec2::ZERO, 0.1);
//! tracker.set_target(Vec2::ONE);
//! tracker.step();
//! assert!((tracker.position().x - 0.1).abs() < 1e-6);
//! ```

use glam::Vec2;

/// Size of a display region in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A region with a zero side cannot be rendered to or measured.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height, or 1.0 for an empty region.
    #[inline]
    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for Viewport {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// Raw pointer state inside one display region.
///
/// Positions are recomputed on every move event from the region size at
/// that moment, never polled.
#[derive(Debug, Clone)]
pub struct Pointer {
    // Position in region pixels, origin top-left
    position: Vec2,
    // Normalized device coordinates (-1 to 1), y up
    ndc: Vec2,
    // Unit coordinates (0 to 1), y up
    uv: Vec2,
    region: Viewport,
    // Set by a move event, cleared when a frame consumes it
    moved: bool,
}

impl Pointer {
    /// Create a pointer resting at the centre of `region`.
    pub fn new(region: Viewport) -> Self {
        Self {
            position: region.size() * 0.5,
            ndc: Vec2::ZERO,
            uv: Vec2::splat(0.5),
            region,
            moved: false,
        }
    }

    /// Get the pointer position in region pixels.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Get the pointer position in normalized device coordinates (-1 to 1).
    ///
    /// Origin is at the centre of the region. X increases to the right, Y increases upward.
    pub fn ndc(&self) -> Vec2 {
        self.ndc
    }

    /// Get the pointer position in unit coordinates (0 to 1), Y upward.
    pub fn uv(&self) -> Vec2 {
        self.uv
    }

    /// Current region used for normalization.
    pub fn region(&self) -> Viewport {
        self.region
    }

    /// Record a pointer move to `position` (region pixels).
    ///
    /// In an empty region the pixel position is kept but the normalized
    /// coordinates are left untouched.
    pub fn move_to(&mut self, position: Vec2) {
        self.position = position;
        self.moved = true;

        if self.region.is_empty() {
            return;
        }
        let size = self.region.size();
        self.uv = Vec2::new(position.x / size.x, 1.0 - position.y / size.y);
        self.ndc = self.uv * 2.0 - Vec2::ONE;
    }

    /// Update the region size used for normalization.
    pub fn set_region(&mut self, region: Viewport) {
        self.region = region;
    }

    /// Whether a move happened since the last call, clearing the flag.
    pub fn take_moved(&mut self) -> bool {
        std::mem::take(&mut self.moved)
    }
}

/// Exponential easing toward a moving target.
///
/// Each [`step`](Self::step) moves the eased value a fixed fraction of the
/// remaining distance: after `k` steps toward a constant target `P1` from
/// `P0` the value is `P1 - (P1 - P0) * (1 - follow)^k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerTracker {
    target: Vec2,
    position: Vec2,
    follow: f32,
}

impl PointerTracker {
    /// Create a tracker resting at `start`, closing `follow` of the gap per step.
    pub fn new(start: Vec2, follow: f32) -> Self {
        Self {
            target: start,
            position: start,
            follow: follow.clamp(0.0, 1.0),
        }
    }

    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Eased position.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn follow(&self) -> f32 {
        self.follow
    }

    /// Advance one frame.
    pub fn step(&mut self) -> Vec2 {
        self.position += (self.target - self.position) * self.follow;
        self.position
    }

    /// Number of steps after which any jump is within `tolerance` of its
    /// size, i.e. the smallest `k` with `(1 - follow)^k <= tolerance`.
    ///
    /// Returns `None` for a tolerance that is not positive, or when the
    /// tracker never moves (`follow == 0`) and the tolerance is below 1.
    pub fn frames_to_settle(&self, tolerance: f32) -> Option<u32> {
        if tolerance.is_nan() || tolerance <= 0.0 {
            return None;
        }
        if tolerance >= 1.0 {
            return Some(0);
        }
        if self.follow <= 0.0 {
            return None;
        }
        if self.follow >= 1.0 {
            return Some(1);
        }
        let k = tolerance.ln() / (1.0 - self.follow).ln();
        Some(k.ceil().max(0.0) as u32)
    }
}

/// Decaying activity scalar driven by pointer movement.
///
/// A move sets the target to 1. Each frame eases the level toward the
/// target and then drops the target back to 0, so the level fades out
/// while the pointer rests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activity {
    target: f32,
    level: f32,
    rate: f32,
}

impl Activity {
    pub fn new(rate: f32) -> Self {
        Self {
            target: 0.0,
            level: 0.0,
            rate: rate.clamp(0.0, 1.0),
        }
    }

    /// Note that the pointer moved since the last frame.
    pub fn poke(&mut self) {
        self.target = 1.0;
    }

    /// Advance one frame and return the new level.
    pub fn step(&mut self) -> f32 {
        self.level += (self.target - self.level) * self.rate;
        self.target = 0.0;
        self.level
    }

    pub fn level(&self) -> f32 {
        self.level
    }
}

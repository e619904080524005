//! Simulation clock.
//!
//! Every effect owns one [`Time`]. It is advanced once per rendered frame by
//! the delta the host measured between two frame callbacks, never by polling
//! the wall clock, so a stalled or dropped frame simply produces a larger
//! delta on the next one.
//!
//! # Example
//!
//! ```
//! use backdrop::time::Time;
//!
//! let mut time = Time::with_scale(0.5);
//! time.advance(1.0 / 60.0);
//!
//! assert_eq!(time.frame(), 1);
//! assert!((time.elapsed() - 0.5 / 60.0).abs() < 1e-6);
//! ```

/// How often (in unscaled seconds) the FPS estimate is refreshed.
const FPS_UPDATE_INTERVAL: f32 = 0.5;

/// Time tracking for effects.
///
/// Provides elapsed time, delta time, frame counting and an FPS estimate.
#[derive(Debug, Clone)]
pub struct Time {
    /// Total scaled elapsed time in seconds.
    elapsed_secs: f32,
    /// Scaled time since last frame in seconds.
    delta_secs: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    /// Frames counted since the last FPS update.
    fps_frames: u32,
    /// Unscaled time accumulated since the last FPS update.
    fps_window: f32,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
}

impl Time {
    /// Create a clock at zero running at normal speed.
    pub fn new() -> Self {
        Self::with_scale(1.0)
    }

    /// Create a clock at zero with the given speed multiplier.
    pub fn with_scale(scale: f32) -> Self {
        Self {
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frames: 0,
            fps_window: 0.0,
            time_scale: scale.max(0.0),
        }
    }

    /// Advance by one frame. Call once per frame.
    ///
    /// `raw_delta` is the measured time between this frame and the previous
    /// one, in seconds. Negative or non-finite deltas count as zero so the
    /// clock stays monotonic. Returns the scaled delta.
    pub fn advance(&mut self, raw_delta: f32) -> f32 {
        let raw_delta = if raw_delta.is_finite() { raw_delta.max(0.0) } else { 0.0 };

        self.delta_secs = raw_delta * self.time_scale;
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;

        self.fps_frames += 1;
        self.fps_window += raw_delta;
        if self.fps_window >= FPS_UPDATE_INTERVAL {
            self.fps = self.fps_frames as f32 / self.fps_window;
            self.fps_frames = 0;
            self.fps_window = 0.0;
        }

        self.delta_secs
    }

    /// Total scaled elapsed time in seconds.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Scaled time since last frame in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Calculated frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Current time scale multiplier.
    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Set time scale multiplier.
    ///
    /// - `1.0` = normal speed
    /// - `0.5` = half speed (slow motion)
    /// - `2.0` = double speed
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

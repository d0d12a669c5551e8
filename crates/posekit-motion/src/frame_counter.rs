//! Frame-rate counter with exponential smoothing.
//!
//! ```text
//! fps          = 1 / dt
//! smoothed_fps = smoothed_prev * (1 − ratio) + fps * ratio
//! ```
//!
//! A ratio of 1 tracks the raw rate; a ratio near 0 barely moves.
//!
//! # Example
//!
//! ```rust
//! use posekit_motion::frame_counter::FrameCounter;
//!
//! let mut fc = FrameCounter::new(1.0);
//! fc.tick(0.02).unwrap();
//! assert_eq!(fc.frame_count(), 1);
//! assert!((fc.fps() - 50.0).abs() < 1e-3);
//! ```

use posekit_types::PoseError;

/// Default weight of the newest raw sample.
pub const DEFAULT_SMOOTHING_RATIO: f32 = 0.75;

#[derive(Debug, Clone)]
pub struct FrameCounter {
    smoothing_ratio: f32,
    frame_count: u64,
    fps: f32,
    smoothed_fps: f32,
}

impl Default for FrameCounter {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_RATIO)
    }
}

impl FrameCounter {
    /// `smoothing_ratio` is clamped to `[0, 1]`.
    pub fn new(smoothing_ratio: f32) -> Self {
        Self {
            smoothing_ratio: smoothing_ratio.clamp(0.0, 1.0),
            frame_count: 0,
            fps: 0.0,
            smoothed_fps: 0.0,
        }
    }

    /// Register one frame that took `unscaled_dt` seconds.
    ///
    /// Returns [`PoseError::InvalidArgument`] for a non-positive or
    /// non-finite `unscaled_dt`, leaving the counters untouched.
    pub fn tick(&mut self, unscaled_dt: f32) -> Result<(), PoseError> {
        if !(unscaled_dt > 0.0 && unscaled_dt.is_finite()) {
            return Err(PoseError::InvalidArgument(format!(
                "frame time must be positive, got {unscaled_dt}"
            )));
        }
        self.frame_count += 1;
        self.fps = 1.0 / unscaled_dt;
        self.smoothed_fps =
            self.smoothed_fps * (1.0 - self.smoothing_ratio) + self.fps * self.smoothing_ratio;
        Ok(())
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Raw rate of the last frame.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn smoothed_fps(&self) -> f32 {
        self.smoothed_fps
    }

    pub fn smoothing_ratio(&self) -> f32 {
        self.smoothing_ratio
    }
}

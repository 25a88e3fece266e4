//! One-pole smoothing for control-rate parameters.
//!
//! The arpeggiator rate knob is read at poll rate, not audio rate, and the
//! poll interval is irregular. The smoother is therefore advanced by elapsed
//! time rather than by sample count.
//!
//! # Example
//!
//! ```
//! use polykey_core::SmoothedRate;
//!
//! // 50 ms time constant, starting at 4 Hz
//! let mut rate = SmoothedRate::new(4.0, 50_000);
//!
//! rate.set_target(8.0);
//! rate.advance(10_000); // 10 ms later
//! assert!(rate.current() > 4.0 && rate.current() < 8.0);
//! ```

use crate::Micros;

/// Exponentially smoothed value driven by elapsed microseconds.
#[derive(Debug, Clone)]
pub struct SmoothedRate {
    current: f32,
    target: f32,
    time_constant_us: u32,
}

impl SmoothedRate {
    pub fn new(initial: f32, time_constant_us: u32) -> Self {
        Self {
            current: initial,
            target: initial,
            time_constant_us,
        }
    }

    pub fn immediate(initial: f32) -> Self {
        Self::new(initial, 0)
    }

    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
    }

    /// Move toward the target by `elapsed_us` worth of low-pass filtering.
    pub fn advance(&mut self, elapsed_us: Micros) -> f32 {
        if self.time_constant_us == 0 {
            self.current = self.target;
            return self.current;
        }

        let alpha = 1.0 - (-(elapsed_us as f32) / self.time_constant_us as f32).exp();
        self.current += (self.target - self.current) * alpha;

        // Snap when close enough to avoid creeping forever
        if (self.target - self.current).abs() <= f32::EPSILON * self.target.abs().max(1.0) {
            self.current = self.target;
        }

        self.current
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.current != self.target
    }

    pub fn set_time_constant(&mut self, time_constant_us: u32) {
        self.time_constant_us = time_constant_us;
    }
}

impl Default for SmoothedRate {
    fn default() -> Self {
        Self::new(4.0, 50_000)
    }
}

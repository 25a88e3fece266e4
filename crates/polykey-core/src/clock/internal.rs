//! Free-running step timer.

use crate::smooth::SmoothedRate;
use crate::Micros;

/// Internal clock: a smoothed rate converted to a step interval.
#[derive(Debug, Clone)]
pub struct InternalClock {
    rate: SmoothedRate,
    last_step_us: Micros,
    last_poll_us: Micros,
    /// Fire on the next poll regardless of elapsed time
    primed: bool,
    /// Take the next poll's time as the new timing origin
    anchor_pending: bool,
}

impl InternalClock {
    pub fn new(rate_hz: f32, smoothing_us: u32) -> Self {
        Self {
            rate: SmoothedRate::new(rate_hz, smoothing_us),
            last_step_us: 0,
            last_poll_us: 0,
            primed: false,
            anchor_pending: false,
        }
    }

    /// Arm the clock so the next poll steps immediately.
    pub fn restart(&mut self, now: Micros) {
        self.last_step_us = now;
        self.last_poll_us = now;
        self.primed = true;
        self.anchor_pending = false;
    }

    /// Forget timing history without firing.
    pub fn resync(&mut self, now: Micros) {
        self.last_step_us = now;
        self.last_poll_us = now;
        self.primed = false;
        self.anchor_pending = false;
    }

    /// Like [`resync`](Self::resync), but the first interval counts from the
    /// next poll. For callers that do not know the current time.
    pub fn resync_on_next_poll(&mut self) {
        self.primed = false;
        self.anchor_pending = true;
    }

    /// Returns the number of steps due (0 or 1).
    pub fn poll(&mut self, now: Micros, target_hz: f32) -> u32 {
        if self.anchor_pending {
            self.resync(now);
        }
        self.rate.set_target(target_hz);
        let hz = self.rate.advance(now.wrapping_sub(self.last_poll_us));
        self.last_poll_us = now;

        if self.primed {
            self.primed = false;
            self.last_step_us = now;
            return 1;
        }

        if hz <= 0.0 {
            return 0;
        }

        if now.wrapping_sub(self.last_step_us) >= self.interval_us() {
            self.last_step_us = now;
            1
        } else {
            0
        }
    }

    /// Current step interval derived from the smoothed rate.
    pub fn interval_us(&self) -> Micros {
        let hz = self.rate.current();
        if hz <= 0.0 {
            return Micros::MAX;
        }
        (1_000_000.0 / hz) as Micros
    }

    pub fn smoothed_hz(&self) -> f32 {
        self.rate.current()
    }

    pub fn set_smoothing(&mut self, smoothing_us: u32) {
        self.rate.set_time_constant(smoothing_us);
    }
}

//! External pulse clock (clock-in jack).
//!
//! [`ExternalPulseInput`] is written from the pulse interrupt. [`ExternalClock`]
//! lives in the poll loop and turns the drained pulse count into steps.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::lockfree::{AtomicFlag, CounterCursor, TickCounter};
use crate::Micros;

/// Interrupt-side state for the external clock.
#[derive(Debug)]
pub struct ExternalPulseInput {
    pulses: TickCounter,
    last_accepted_us: AtomicU32,
    primed: AtomicFlag,
    min_spacing_us: AtomicU32,
    indicator: AtomicFlag,
}

impl ExternalPulseInput {
    pub fn new(min_spacing_us: Micros) -> Self {
        Self {
            pulses: TickCounter::new(),
            last_accepted_us: AtomicU32::new(0),
            primed: AtomicFlag::new(false),
            min_spacing_us: AtomicU32::new(min_spacing_us),
            indicator: AtomicFlag::new(false),
        }
    }

    /// Record a rising edge. Safe to call from interrupt context.
    ///
    /// Returns `false` if the pulse was rejected by the debounce window.
    pub fn on_pulse(&self, now: Micros) -> bool {
        if self.primed.get() {
            let last = self.last_accepted_us.load(Ordering::Acquire);
            let spacing = self.min_spacing_us.load(Ordering::Relaxed);
            if now.wrapping_sub(last) < spacing {
                return false;
            }
        }

        // Timestamp before count: a reader that sees the new count also sees
        // a timestamp at least this recent.
        self.last_accepted_us.store(now, Ordering::Release);
        self.primed.set(true);
        self.pulses.increment();
        self.indicator.set(true);
        true
    }

    pub fn set_min_spacing(&self, spacing_us: Micros) {
        self.min_spacing_us.store(spacing_us, Ordering::Relaxed);
    }

    #[inline]
    pub fn pulse_count(&self) -> u32 {
        self.pulses.get()
    }

    #[inline]
    pub fn last_pulse_us(&self) -> Micros {
        self.last_accepted_us.load(Ordering::Acquire)
    }

    /// Consume the pulse-indicator request.
    #[inline]
    pub fn take_indicator(&self) -> bool {
        self.indicator.take()
    }
}

/// Lock status of the external clock as seen by the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExternalStatus {
    /// No pulse seen since the source was selected
    #[default]
    Waiting,
    /// Pulses arriving within the timeout
    Running,
    /// Timed out; stepping halted until pulses resume
    Lost,
}

/// Outcome of one external clock poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExternalPoll {
    pub steps: u32,
    pub lost: bool,
    pub locked: bool,
}

/// Poll-side external clock.
#[derive(Debug, Clone)]
pub struct ExternalClock {
    cursor: CounterCursor,
    phase: u32,
    pulses_per_step: u32,
    timeout_us: Micros,
    status: ExternalStatus,
}

impl ExternalClock {
    pub fn new(pulses_per_step: u32, timeout_us: Micros) -> Self {
        Self {
            cursor: CounterCursor::default(),
            phase: 0,
            pulses_per_step: pulses_per_step.max(1),
            timeout_us,
            status: ExternalStatus::Waiting,
        }
    }

    /// Discard pulses received while this source was inactive.
    pub fn resync(&mut self, input: &ExternalPulseInput) {
        self.cursor.sync_to(input.pulse_count());
        self.phase = 0;
        self.status = ExternalStatus::Waiting;
    }

    pub fn poll(&mut self, input: &ExternalPulseInput, now: Micros) -> ExternalPoll {
        // Reverse of the writer's order: a pulse landing in between shows up
        // as a count change or as a timestamp after `now`.
        let last_pulse = input.last_pulse_us();
        let count = input.pulse_count();
        let mut result = ExternalPoll::default();

        let pulses = self.cursor.drain(count);
        if pulses > 0 {
            if self.status != ExternalStatus::Running {
                tracing::debug!("external clock locked");
                result.locked = true;
            }
            self.status = ExternalStatus::Running;
            result.steps = self.count_steps(pulses);
            return result;
        }

        if self.status == ExternalStatus::Running
            && elapsed_since(last_pulse, now) > self.timeout_us
        {
            tracing::warn!(
                timeout_us = self.timeout_us,
                "external clock lost, halting arpeggiator"
            );
            self.status = ExternalStatus::Lost;
            self.phase = 0;
            result.lost = true;
        }

        result
    }

    fn count_steps(&mut self, pulses: u32) -> u32 {
        let steps = steps_in_window(self.phase, pulses, self.pulses_per_step);
        self.phase = ((self.phase as u64 + pulses as u64) % self.pulses_per_step as u64) as u32;
        steps
    }

    pub fn status(&self) -> ExternalStatus {
        self.status
    }

    pub fn set_pulses_per_step(&mut self, pulses: u32) {
        self.pulses_per_step = pulses.max(1);
        self.phase %= self.pulses_per_step;
    }

    pub fn set_timeout(&mut self, timeout_us: Micros) {
        self.timeout_us = timeout_us;
    }
}

/// Time from `then` to `now` on the wrapping microsecond clock. A `then`
/// slightly ahead of `now` (stamped by the interrupt after the poll read its
/// time) counts as zero.
#[inline]
fn elapsed_since(then: Micros, now: Micros) -> Micros {
    let elapsed = now.wrapping_sub(then);
    if elapsed > Micros::MAX / 2 {
        0
    } else {
        elapsed
    }
}

/// Count positions `k` in `[phase, phase + len)` with `k % divisor == 0`.
pub(crate) fn steps_in_window(phase: u32, len: u32, divisor: u32) -> u32 {
    let divisor = divisor.max(1);
    let first = (divisor - phase % divisor) % divisor;
    if len <= first {
        return 0;
    }
    1 + (len - 1 - first) / divisor
}

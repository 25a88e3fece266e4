//! MIDI beat clock.
//!
//! [`MidiClockInput`] receives realtime messages from the MIDI receive path
//! (interrupt or driver callback). [`MidiClock`] drains it in the poll loop.

use std::sync::atomic::{AtomicU32, Ordering};

use super::external::steps_in_window;
use super::source::MidiDivision;
use crate::lockfree::{AtomicFlag, CounterCursor, TickCounter};

/// Receive-side state for MIDI clock and transport.
#[derive(Debug, Default)]
pub struct MidiClockInput {
    ticks: TickCounter,
    /// Sequence counter around Start/Continue/Stop: odd while a transport
    /// message is being applied
    epoch: AtomicU32,
    running: AtomicFlag,
}

impl MidiClockInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// 0xF8 Timing Clock.
    pub fn on_tick(&self) {
        if self.running.get() {
            self.ticks.increment();
        }
    }

    /// 0xFA Start.
    pub fn on_start(&self) {
        self.restart();
    }

    /// 0xFB Continue. Treated like Start: the step grid restarts.
    pub fn on_continue(&self) {
        self.restart();
    }

    /// 0xFC Stop.
    pub fn on_stop(&self) {
        self.begin_transport();
        self.running.set(false);
        self.end_transport();
    }

    fn restart(&self) {
        self.begin_transport();
        self.ticks.reset();
        self.running.set(true);
        self.end_transport();
    }

    #[inline]
    fn begin_transport(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    #[inline]
    fn end_transport(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Consistent view of (epoch, running, ticks), or `None` if a transport
    /// message was being applied while reading.
    fn snapshot(&self) -> Option<(u32, bool, u32)> {
        let before = self.epoch.load(Ordering::Acquire);
        if before % 2 == 1 {
            return None;
        }
        let running = self.running.get();
        let ticks = self.ticks.get();
        let after = self.epoch.load(Ordering::Acquire);
        (before == after).then_some((before, running, ticks))
    }
}

/// Transport change observed during a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiTransport {
    /// Start or Continue received; tick grid reset
    Started,
    Stopped,
}

/// Outcome of one MIDI clock poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MidiPoll {
    pub steps: u32,
    pub transport: Option<MidiTransport>,
}

/// Poll-side MIDI clock.
#[derive(Debug, Clone)]
pub struct MidiClock {
    cursor: CounterCursor,
    epoch: u32,
    running: bool,
    phase: u32,
    division: MidiDivision,
}

impl MidiClock {
    pub fn new(division: MidiDivision) -> Self {
        Self {
            cursor: CounterCursor::default(),
            epoch: 0,
            running: false,
            phase: 0,
            division,
        }
    }

    /// Adopt the input's current transport state without reporting it.
    pub fn resync(&mut self, input: &MidiClockInput) {
        if let Some((epoch, running, ticks)) = input.snapshot() {
            self.epoch = epoch;
            self.running = running;
            self.cursor.sync_to(ticks);
            // Stay on the grid that started at the last Start/Continue
            self.phase = ticks % self.division.ticks_per_step();
        }
    }

    pub fn poll(&mut self, input: &MidiClockInput) -> MidiPoll {
        let mut result = MidiPoll::default();

        // Torn read; the next iteration sees the settled state.
        let Some((epoch, running, ticks)) = input.snapshot() else {
            return result;
        };

        if epoch != self.epoch {
            self.epoch = epoch;
            self.running = running;
            if running {
                // Ticks were reset by Start/Continue; count from zero.
                self.cursor.sync_to(0);
                self.phase = 0;
                result.transport = Some(MidiTransport::Started);
                tracing::debug!("MIDI clock started");
            } else {
                self.cursor.sync_to(ticks);
                result.transport = Some(MidiTransport::Stopped);
                tracing::debug!("MIDI clock stopped");
                return result;
            }
        }

        if !self.running {
            self.cursor.sync_to(ticks);
            return result;
        }

        let delta = self.cursor.drain(ticks);
        let divisor = self.division.ticks_per_step();
        result.steps = steps_in_window(self.phase, delta, divisor);
        self.phase = ((self.phase as u64 + delta as u64) % divisor as u64) as u32;
        result
    }

    pub fn set_division(&mut self, division: MidiDivision) {
        self.division = division;
        self.phase %= division.ticks_per_step();
    }

    pub fn division(&self) -> MidiDivision {
        self.division
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

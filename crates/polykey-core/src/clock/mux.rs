//! Arpeggiator clock multiplexer.

use std::sync::Arc;

use super::external::{ExternalClock, ExternalStatus};
use super::inputs::ClockInputs;
use super::internal::InternalClock;
use super::midi::{MidiClock, MidiTransport};
use super::source::{ClockSource, MidiDivision};
use crate::config::ClockConfig;
use crate::Micros;

/// Everything the sequencer needs to know after one clock poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockPoll {
    /// Steps due since the previous poll
    pub steps: u32,
    /// The active source stopped; a sounding step must be released now
    pub halt: bool,
    /// An external pulse was accepted (drives the UI indicator)
    pub pulse: bool,
    pub lost: bool,
    pub locked: bool,
    pub transport: Option<MidiTransport>,
}

/// Selects one of the three step sources and drains it once per poll.
///
/// Inactive sources are not polled; when one becomes active it is resynced
/// so that pulses or ticks received meanwhile are not replayed as steps.
pub struct ClockMultiplexer {
    inputs: Arc<ClockInputs>,
    source: ClockSource,
    internal: InternalClock,
    external: ExternalClock,
    midi: MidiClock,
}

impl ClockMultiplexer {
    pub fn new(config: &ClockConfig, inputs: Arc<ClockInputs>) -> Self {
        let mut mux = Self {
            inputs,
            source: config.source,
            internal: InternalClock::new(config.rate_hz, config.rate_smoothing_us),
            external: ExternalClock::new(config.pulses_per_step, config.loss_timeout_us),
            midi: MidiClock::new(config.midi_division),
        };
        mux.external.resync(mux.inputs.external());
        mux.midi.resync(mux.inputs.midi());
        mux
    }

    pub fn inputs(&self) -> &Arc<ClockInputs> {
        &self.inputs
    }

    pub fn source(&self) -> ClockSource {
        self.source
    }

    /// Switch sources. Returns `true` if the source actually changed; the
    /// caller must then release any in-flight step. The internal clock times
    /// its first interval from the next poll.
    pub fn set_source(&mut self, source: ClockSource) -> bool {
        if source == self.source {
            return false;
        }
        tracing::debug!(from = self.source.name(), to = source.name(), "clock source changed");
        self.source = source;
        self.resync_active();
        true
    }

    /// Called when the sequencer starts running. The internal clock steps on
    /// the very next poll; external sources wait for their next edge.
    pub fn restart(&mut self, now: Micros) {
        if self.source == ClockSource::Internal {
            self.internal.restart(now);
        }
    }

    pub fn poll(&mut self, now: Micros) -> ClockPoll {
        let mut result = ClockPoll::default();

        // Always consume the indicator so it cannot fire late after a switch
        let pulse = self.inputs.external().take_indicator();

        match self.source {
            ClockSource::Internal => {
                result.steps = self.internal.poll(now, self.inputs.rate_hz());
            }
            ClockSource::External => {
                let poll = self.external.poll(self.inputs.external(), now);
                result.steps = poll.steps;
                result.lost = poll.lost;
                result.locked = poll.locked;
                result.halt = poll.lost;
                result.pulse = pulse;
            }
            ClockSource::Midi => {
                let poll = self.midi.poll(self.inputs.midi());
                result.steps = poll.steps;
                result.transport = poll.transport;
                result.halt = poll.transport == Some(MidiTransport::Stopped);
            }
        }

        result
    }

    /// True while the active source cannot produce steps.
    pub fn is_halted(&self) -> bool {
        match self.source {
            ClockSource::Internal => false,
            ClockSource::External => self.external.status() != ExternalStatus::Running,
            ClockSource::Midi => !self.midi.is_running(),
        }
    }

    pub fn external_status(&self) -> ExternalStatus {
        self.external.status()
    }

    pub fn set_midi_division(&mut self, division: MidiDivision) {
        self.midi.set_division(division);
    }

    pub fn midi_division(&self) -> MidiDivision {
        self.midi.division()
    }

    pub fn set_pulses_per_step(&mut self, pulses: u32) {
        self.external.set_pulses_per_step(pulses);
    }

    pub fn set_loss_timeout(&mut self, timeout_us: Micros) {
        self.external.set_timeout(timeout_us);
    }

    pub fn set_rate_smoothing(&mut self, smoothing_us: Micros) {
        self.internal.set_smoothing(smoothing_us);
    }

    pub fn smoothed_rate_hz(&self) -> f32 {
        self.internal.smoothed_hz()
    }

    fn resync_active(&mut self) {
        match self.source {
            ClockSource::Internal => self.internal.resync_on_next_poll(),
            ClockSource::External => self.external.resync(self.inputs.external()),
            ClockSource::Midi => self.midi.resync(self.inputs.midi()),
        }
    }
}

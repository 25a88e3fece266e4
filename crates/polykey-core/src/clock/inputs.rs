//! Shared handle for everything written outside the poll loop.

use super::external::ExternalPulseInput;
use super::midi::MidiClockInput;
use crate::config::{MAX_RATE_HZ, MIN_RATE_HZ};
use crate::lockfree::AtomicFloat;
use crate::Micros;

/// Clock-related values written from interrupt or callback context.
///
/// Wrap in an `Arc` and hand clones to the pulse ISR, the MIDI receive
/// callback and the control-surface scanner. Every method takes `&self`.
#[derive(Debug)]
pub struct ClockInputs {
    external: ExternalPulseInput,
    midi: MidiClockInput,
    rate_hz: AtomicFloat,
}

impl ClockInputs {
    pub fn new(rate_hz: f32, min_pulse_spacing_us: Micros) -> Self {
        Self {
            external: ExternalPulseInput::new(min_pulse_spacing_us),
            midi: MidiClockInput::new(),
            rate_hz: AtomicFloat::new(rate_hz),
        }
    }

    /// Clock-in rising edge. Interrupt-safe.
    #[inline]
    pub fn on_external_clock_pulse(&self, now: Micros) -> bool {
        self.external.on_pulse(now)
    }

    #[inline]
    pub fn on_midi_clock_tick(&self) {
        self.midi.on_tick();
    }

    #[inline]
    pub fn on_midi_start(&self) {
        self.midi.on_start();
    }

    #[inline]
    pub fn on_midi_continue(&self) {
        self.midi.on_continue();
    }

    #[inline]
    pub fn on_midi_stop(&self) {
        self.midi.on_stop();
    }

    /// Target internal arpeggiator rate. Smoothed in the poll loop.
    #[inline]
    pub fn set_rate_hz(&self, hz: f32) {
        self.rate_hz.set(hz.clamp(MIN_RATE_HZ, MAX_RATE_HZ));
    }

    #[inline]
    pub fn rate_hz(&self) -> f32 {
        self.rate_hz.get()
    }

    pub fn external(&self) -> &ExternalPulseInput {
        &self.external
    }

    pub fn midi(&self) -> &MidiClockInput {
        &self.midi
    }
}

//! Arpeggiator step sources.
//!
//! Three interchangeable sources feed the sequencer:
//! - Internal - smoothed rate timer
//! - External - debounced analog pulse train with loss-of-clock detection
//! - MIDI - 24 PPQN beat clock with Start/Continue/Stop transport

mod external;
mod inputs;
mod internal;
mod midi;
mod mux;
mod source;

pub use external::{ExternalClock, ExternalPoll, ExternalPulseInput, ExternalStatus};
pub use inputs::ClockInputs;
pub use internal::InternalClock;
pub use midi::{MidiClock, MidiClockInput, MidiPoll, MidiTransport};
pub use mux::{ClockMultiplexer, ClockPoll};
pub use source::{ClockSource, MidiDivision, MIDI_PPQN};

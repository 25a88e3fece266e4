//! Clock source selection and MIDI clock subdivisions.

use serde::{Deserialize, Serialize};

/// Origin of arpeggiator step timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ClockSource {
    /// Free-running timer driven by the rate control
    #[default]
    Internal = 0,
    /// Analog pulse train (clock-in jack), counted in interrupt context
    External = 1,
    /// MIDI beat clock, 24 PPQN
    Midi = 2,
}

impl ClockSource {
    pub fn from_u8(val: u8) -> Self {
        match val {
            1 => ClockSource::External,
            2 => ClockSource::Midi,
            _ => ClockSource::Internal,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClockSource::Internal => "Internal",
            ClockSource::External => "External",
            ClockSource::Midi => "MIDI",
        }
    }

    pub fn next(&self) -> ClockSource {
        match self {
            ClockSource::Internal => ClockSource::External,
            ClockSource::External => ClockSource::Midi,
            ClockSource::Midi => ClockSource::Internal,
        }
    }
}

/// MIDI clock ticks per quarter note.
pub const MIDI_PPQN: u32 = 24;

/// How many MIDI clock ticks make up one arpeggiator step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MidiDivision {
    Quarter,
    Eighth,
    EighthTriplet,
    #[default]
    Sixteenth,
    SixteenthTriplet,
}

impl MidiDivision {
    pub fn ticks_per_step(&self) -> u32 {
        match self {
            MidiDivision::Quarter => MIDI_PPQN,
            MidiDivision::Eighth => MIDI_PPQN / 2,
            MidiDivision::EighthTriplet => MIDI_PPQN / 3,
            MidiDivision::Sixteenth => MIDI_PPQN / 4,
            MidiDivision::SixteenthTriplet => MIDI_PPQN / 6,
        }
    }

    pub fn from_ticks(ticks: u32) -> Option<Self> {
        match ticks {
            24 => Some(MidiDivision::Quarter),
            12 => Some(MidiDivision::Eighth),
            8 => Some(MidiDivision::EighthTriplet),
            6 => Some(MidiDivision::Sixteenth),
            4 => Some(MidiDivision::SixteenthTriplet),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MidiDivision::Quarter => "1/4",
            MidiDivision::Eighth => "1/8",
            MidiDivision::EighthTriplet => "1/8T",
            MidiDivision::Sixteenth => "1/16",
            MidiDivision::SixteenthTriplet => "1/16T",
        }
    }
}

//! Clock configuration.

use serde::{Deserialize, Serialize};

use crate::clock::{ClockSource, MidiDivision};
use crate::{Error, Micros, Result};

/// Slowest internal arpeggiator rate.
pub const MIN_RATE_HZ: f32 = 0.1;

/// Fastest internal arpeggiator rate.
pub const MAX_RATE_HZ: f32 = 100.0;

/// Configuration for the arpeggiator clock multiplexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub source: ClockSource,
    /// Internal rate in steps per second
    pub rate_hz: f32,
    /// One-pole time constant for rate changes
    pub rate_smoothing_us: Micros,
    /// Pulses closer together than this are contact bounce
    pub min_pulse_spacing_us: Micros,
    /// No pulse for this long means the external clock is gone
    pub loss_timeout_us: Micros,
    pub pulses_per_step: u32,
    pub midi_division: MidiDivision,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            source: ClockSource::Internal,
            rate_hz: 4.0,
            rate_smoothing_us: 50_000,
            min_pulse_spacing_us: 2_000,
            loss_timeout_us: 2_000_000,
            pulses_per_step: 1,
            midi_division: MidiDivision::Sixteenth,
        }
    }
}

impl ClockConfig {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_RATE_HZ..=MAX_RATE_HZ).contains(&self.rate_hz) {
            return Err(Error::InvalidRate(self.rate_hz));
        }
        if self.pulses_per_step == 0 {
            return Err(Error::InvalidDivision(0));
        }
        if self.loss_timeout_us <= self.min_pulse_spacing_us {
            return Err(Error::InvalidConfig(format!(
                "loss timeout {}us must exceed pulse spacing {}us",
                self.loss_timeout_us, self.min_pulse_spacing_us
            )));
        }
        Ok(())
    }
}

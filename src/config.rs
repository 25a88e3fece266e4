//! Engine configuration.

use serde::{Deserialize, Serialize};

use polykey_arp::ArpConfig;
use polykey_core::ClockConfig;
use polykey_synth::{
    KeyMode, PerZone, UnisonConfig, VoiceAllocatorConfig, A4_FREQ, MAX_UNISON_VOICES, NUM_PITCHES,
};

use crate::{Error, Result};

/// Default first pitch of the Upper zone (middle C).
pub const DEFAULT_SPLIT_POINT: u8 = 60;

/// Everything needed to build a [`PerformanceEngine`](crate::PerformanceEngine).
///
/// Every field has a default, so a host can deserialize a partial document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub voices: VoiceAllocatorConfig,
    pub clock: ClockConfig,
    pub arp: ArpConfig,
    pub key_mode: KeyMode,
    /// First pitch routed to the Upper zone in split mode
    pub split_point: u8,
    /// Voices owned by the Lower zone in split and dual modes, `None` for half
    pub lower_voices: Option<usize>,
    pub unison: UnisonConfig,
    /// Detune applied to the Upper layer in dual mode
    pub dual_detune_cents: f32,
    /// Octave shift per zone, -2..=2
    pub octaves: PerZone<i8>,
    /// Frequency of A4
    pub reference_hz: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            voices: VoiceAllocatorConfig::default(),
            clock: ClockConfig::default(),
            arp: ArpConfig::default(),
            key_mode: KeyMode::Whole,
            split_point: DEFAULT_SPLIT_POINT,
            lower_voices: None,
            unison: UnisonConfig::default(),
            dual_detune_cents: 0.0,
            octaves: PerZone::splat(0),
            reference_hz: A4_FREQ,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.voices.validate()?;
        self.clock.validate()?;
        self.arp.validate()?;

        if self.split_point as usize >= NUM_PITCHES {
            return Err(polykey_synth::Error::InvalidSplitPoint(self.split_point).into());
        }
        if let Some(lower) = self.lower_voices {
            if lower > self.voices.max_voices {
                return Err(Error::InvalidConfig(format!(
                    "lower zone wants {lower} voices but the pool has {}",
                    self.voices.max_voices
                )));
            }
        }
        if !(1..=MAX_UNISON_VOICES).contains(&(self.unison.voice_count as usize)) {
            return Err(Error::InvalidConfig(format!(
                "unison voice count {} outside 1-{MAX_UNISON_VOICES}",
                self.unison.voice_count
            )));
        }
        if let Some((zone, octave)) = self.octaves.iter().find(|(_, o)| !(-2..=2).contains(*o)) {
            return Err(Error::InvalidConfig(format!(
                "{} zone octave shift {octave} outside -2..=2",
                zone.name()
            )));
        }
        if !(self.reference_hz.is_finite() && self.reference_hz > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "reference pitch {}Hz must be positive",
                self.reference_hz
            )));
        }
        Ok(())
    }

    /// Lower-zone voice count after applying the default.
    pub fn lower_voice_count(&self) -> usize {
        self.lower_voices.unwrap_or(self.voices.max_voices / 2)
    }
}

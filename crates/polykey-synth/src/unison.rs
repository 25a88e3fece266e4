//! Unison detune spread.

use serde::{Deserialize, Serialize};

use crate::tuning::cents_to_ratio;

pub const MAX_UNISON_VOICES: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnisonConfig {
    /// 1-16
    pub voice_count: u8,
    /// Total spread in cents (not per-voice)
    pub detune_cents: f32,
}

impl Default for UnisonConfig {
    fn default() -> Self {
        Self {
            voice_count: 8,
            detune_cents: 10.0,
        }
    }
}

/// Per-slot frequency ratios for a unison stack.
///
/// Slots are spread symmetrically around the center pitch: slot 0 is the
/// flattest, the last slot the sharpest.
#[derive(Debug, Clone)]
pub struct UnisonEngine {
    config: UnisonConfig,
    ratios: [f32; MAX_UNISON_VOICES],
}

impl UnisonEngine {
    pub fn new(config: UnisonConfig) -> Self {
        let mut engine = Self {
            config,
            ratios: [1.0; MAX_UNISON_VOICES],
        };
        engine.recompute();
        engine
    }

    fn recompute(&mut self) {
        let count = self.voice_count();

        for (i, ratio) in self.ratios.iter_mut().enumerate() {
            *ratio = if i >= count || count == 1 {
                1.0
            } else {
                let position = (i as f32 / (count - 1) as f32) * 2.0 - 1.0;
                cents_to_ratio(position * self.config.detune_cents * 0.5)
            };
        }
    }

    #[inline]
    pub fn voice_count(&self) -> usize {
        (self.config.voice_count as usize).clamp(1, MAX_UNISON_VOICES)
    }

    #[inline]
    pub fn ratio(&self, slot: usize) -> f32 {
        self.ratios[slot.min(MAX_UNISON_VOICES - 1)]
    }

    pub fn set_voice_count(&mut self, count: u8) {
        self.config.voice_count = count.clamp(1, MAX_UNISON_VOICES as u8);
        self.recompute();
    }

    pub fn set_detune(&mut self, cents: f32) {
        self.config.detune_cents = cents.max(0.0);
        self.recompute();
    }

    pub fn config(&self) -> &UnisonConfig {
        &self.config
    }
}

//! Builder for configuring and constructing a `PerformanceEngine`.

use polykey_arp::{ArpMode, ArpVelocity};
use polykey_core::{ClockSource, Micros, MidiDivision};
use polykey_synth::{KeyMode, StealPolicy, Zone};

use crate::{EngineConfig, PerformanceEngine, Result};

/// Fluent front end for [`EngineConfig`].
///
/// Every setter has the default documented on the config field; `build`
/// validates the whole configuration.
///
/// # Example
///
/// ```
/// use polykey::prelude::*;
///
/// let engine = PerformanceEngine::builder()
///     .voices(16)
///     .key_mode(KeyMode::Dual)
///     .dual_detune(6.0)
///     .clock_source(ClockSource::Midi)
///     .midi_division(MidiDivision::Eighth)
///     .arp_mode(ArpMode::UpDown)
///     .arp_range(2)
///     .build()?;
///
/// assert_eq!(engine.state().voices().max_voices(), 16);
/// # Ok::<(), polykey::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    /// Start from a complete configuration, e.g. one loaded by the host.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 8
    pub fn voices(mut self, count: usize) -> Self {
        self.config.voices.max_voices = count;
        self
    }

    /// Default: [`StealPolicy::Oldest`] in every zone
    pub fn steal_policy(mut self, zone: Zone, policy: StealPolicy) -> Self {
        self.config.voices.policies[zone] = policy;
        self
    }

    pub fn key_mode(mut self, mode: KeyMode) -> Self {
        self.config.key_mode = mode;
        self
    }

    /// Default: 60
    pub fn split_point(mut self, pitch: u8) -> Self {
        self.config.split_point = pitch;
        self
    }

    /// Default: half the pool
    pub fn lower_voices(mut self, count: usize) -> Self {
        self.config.lower_voices = Some(count);
        self
    }

    pub fn unison_voices(mut self, count: u8) -> Self {
        self.config.unison.voice_count = count;
        self
    }

    pub fn unison_detune(mut self, cents: f32) -> Self {
        self.config.unison.detune_cents = cents;
        self
    }

    pub fn dual_detune(mut self, cents: f32) -> Self {
        self.config.dual_detune_cents = cents;
        self
    }

    pub fn octave(mut self, zone: Zone, octave: i8) -> Self {
        self.config.octaves[zone] = octave;
        self
    }

    /// Default: 440 Hz
    pub fn reference_hz(mut self, hz: f32) -> Self {
        self.config.reference_hz = hz;
        self
    }

    pub fn clock_source(mut self, source: ClockSource) -> Self {
        self.config.clock.source = source;
        self
    }

    /// Default: 4 steps per second
    pub fn arp_rate(mut self, hz: f32) -> Self {
        self.config.clock.rate_hz = hz;
        self
    }

    pub fn rate_smoothing(mut self, time_constant_us: Micros) -> Self {
        self.config.clock.rate_smoothing_us = time_constant_us;
        self
    }

    /// Default: 2 ms
    pub fn min_pulse_spacing(mut self, spacing_us: Micros) -> Self {
        self.config.clock.min_pulse_spacing_us = spacing_us;
        self
    }

    /// Default: 2 s
    pub fn clock_loss_timeout(mut self, timeout_us: Micros) -> Self {
        self.config.clock.loss_timeout_us = timeout_us;
        self
    }

    pub fn pulses_per_step(mut self, pulses: u32) -> Self {
        self.config.clock.pulses_per_step = pulses;
        self
    }

    /// Default: sixteenth notes
    pub fn midi_division(mut self, division: MidiDivision) -> Self {
        self.config.clock.midi_division = division;
        self
    }

    pub fn arp_mode(mut self, mode: ArpMode) -> Self {
        self.config.arp.mode = mode;
        self
    }

    /// Default: 1 octave
    pub fn arp_range(mut self, octaves: u8) -> Self {
        self.config.arp.range = octaves;
        self
    }

    pub fn arp_velocity(mut self, velocity: ArpVelocity) -> Self {
        self.config.arp.velocity = velocity;
        self
    }

    pub fn arp_seed(mut self, seed: u64) -> Self {
        self.config.arp.seed = seed;
        self
    }

    pub fn build(self) -> Result<PerformanceEngine> {
        PerformanceEngine::new(self.config)
    }
}

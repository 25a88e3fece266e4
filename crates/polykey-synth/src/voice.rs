//! Zone-aware voice allocator with per-zone stealing policies.
//!
//! Maps `(zone, pitch)` pairs onto a fixed pool of voices:
//! - Free voices are taken lowest index first within the zone's sub-pool
//! - Exhausted pools steal through the zone's [`StealPolicy`]
//! - Unison presses claim several voices for one pair
//! - Every change is queued as a [`VoiceCommand`] in emission order
//!
//! No heap allocation happens after construction: the command queue is
//! reserved up front and drained by the caller every poll.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::policy::StealPolicy;
use crate::tuning::{cents_to_ratio, Tuning};
use crate::unison::UnisonEngine;
use crate::zone::{KeyMode, PerZone, Zone, ZoneLayout, ZoneSettings, NUM_PITCHES};

/// Largest pool the allocator can track (one bit per voice in [`VoiceMask`]).
pub const MAX_VOICES: usize = 64;

/// State of a single voice slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Voice {
    /// Pitch being sounded, `None` when the voice is free
    pub note: Option<u8>,
    /// Zone that owns the note
    pub zone: Zone,
    /// MIDI velocity (0-127)
    pub velocity: u8,
    /// Allocator counter value at assignment; larger is newer
    pub time_on: u64,
    /// Key is up but the hold latch keeps the voice sounding
    pub sustained: bool,
    /// Physical key (or arpeggiator step) still holding the note
    pub key_down: bool,
    /// Sounding frequency in Hz, after octave shift and detune
    pub frequency: f32,
    /// Index within the zone's sub-pool in split and dual layouts
    pub zone_position: Option<usize>,
    pub active: bool,
    /// Sounded by the arpeggiator rather than a key
    pub synthetic: bool,
}

impl Voice {
    #[inline]
    pub fn is_free(&self) -> bool {
        self.note.is_none()
    }
}

/// Command for the sound-generation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceCommand {
    NoteOn {
        voice: usize,
        frequency: f32,
        velocity: u8,
    },
    NoteOff {
        voice: usize,
    },
}

impl VoiceCommand {
    pub fn voice(&self) -> usize {
        match *self {
            VoiceCommand::NoteOn { voice, .. } | VoiceCommand::NoteOff { voice } => voice,
        }
    }
}

/// Set of voice indices, one bit per voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoiceMask(u64);

impl VoiceMask {
    pub const EMPTY: Self = Self(0);

    #[inline]
    pub fn single(voice: usize) -> Self {
        let mut mask = Self::EMPTY;
        mask.insert(voice);
        mask
    }

    #[inline]
    pub fn insert(&mut self, voice: usize) {
        debug_assert!(voice < MAX_VOICES);
        self.0 |= 1u64 << voice;
    }

    #[inline]
    pub fn remove(&mut self, voice: usize) {
        self.0 &= !(1u64 << voice);
    }

    #[inline]
    pub fn contains(&self, voice: usize) -> bool {
        voice < MAX_VOICES && self.0 & (1u64 << voice) != 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Lowest voice index in the set.
    pub fn first(&self) -> Option<usize> {
        (!self.is_empty()).then(|| self.0.trailing_zeros() as usize)
    }

    /// Voice indices in ascending order.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        let mut bits = self.0;
        core::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let voice = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(voice)
        })
    }
}

/// A note that lost its voice to a steal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StolenNote {
    pub voice: usize,
    pub zone: Zone,
    pub note: u8,
}

/// Outcome of an assignment request.
#[derive(Debug, Clone, Default)]
pub struct Allocation {
    /// Voices now sounding the requested pitch
    pub voices: VoiceMask,
    /// Notes silenced to make room, in steal order
    pub stolen: SmallVec<[StolenNote; 4]>,
    /// Requested slots that could not be served
    pub dropped: usize,
}

impl Allocation {
    /// First voice assigned, if any.
    pub fn voice(&self) -> Option<usize> {
        self.voices.first()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

/// Configuration for the voice allocator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceAllocatorConfig {
    /// Size of the voice pool (1-64)
    pub max_voices: usize,
    /// Steal policy for each zone's sub-pool
    pub policies: PerZone<StealPolicy>,
}

impl Default for VoiceAllocatorConfig {
    fn default() -> Self {
        Self {
            max_voices: 8,
            policies: PerZone::splat(StealPolicy::Oldest),
        }
    }
}

impl VoiceAllocatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_voices == 0 {
            return Err(Error::InvalidConfig(
                "voice pool must contain at least one voice".into(),
            ));
        }
        if self.max_voices > MAX_VOICES {
            return Err(Error::TooManyVoices {
                requested: self.max_voices,
                max: MAX_VOICES,
            });
        }
        Ok(())
    }
}

/// Polyphonic, zone-partitioned voice allocator.
pub struct VoiceAllocator {
    policies: PerZone<StealPolicy>,
    layout: ZoneLayout,
    voices: Vec<Voice>,

    /// `(zone, pitch)` -> voices sounding it
    assignment: PerZone<[VoiceMask; NUM_PITCHES]>,

    settings: PerZone<ZoneSettings>,
    tuning: Tuning,
    unison: UnisonEngine,

    /// Monotonic stamp for `Voice::time_on`
    counter: u64,
    commands: Vec<VoiceCommand>,
}

impl VoiceAllocator {
    /// Create an allocator laid out as a single whole-keyboard zone.
    ///
    /// Pool sizes beyond [`MAX_VOICES`] are clamped; use
    /// [`VoiceAllocatorConfig::validate`] to reject them instead.
    pub fn new(config: VoiceAllocatorConfig) -> Self {
        let pool = config.max_voices.clamp(1, MAX_VOICES);

        Self {
            policies: config.policies,
            layout: ZoneLayout::new(KeyMode::Whole, pool),
            voices: vec![Voice::default(); pool],
            assignment: PerZone::splat([VoiceMask::EMPTY; NUM_PITCHES]),
            settings: PerZone::default(),
            tuning: Tuning::default(),
            unison: UnisonEngine::new(Default::default()),
            counter: 0,
            // Worst case per request: a stolen NoteOff plus NoteOn for every voice
            commands: Vec::with_capacity(pool * 4),
        }
    }

    /// Assign one voice to `pitch` in `zone`.
    pub fn assign(&mut self, zone: Zone, pitch: u8, velocity: u8) -> Allocation {
        self.assign_voices(zone, pitch, velocity, 1, false)
    }

    /// Assign one voice on behalf of the arpeggiator.
    pub fn assign_synthetic(&mut self, zone: Zone, pitch: u8, velocity: u8) -> Allocation {
        self.assign_voices(zone, pitch, velocity, 1, true)
    }

    /// Assign `count` detuned voices to one key press.
    ///
    /// Slots are served independently: each takes a free voice if one exists,
    /// otherwise steals. Slots that cannot be served are reported in
    /// [`Allocation::dropped`] while the others still sound.
    pub fn assign_unison(&mut self, zone: Zone, pitch: u8, velocity: u8, count: usize) -> Allocation {
        let count = count.clamp(1, self.voices.len());
        if count != self.unison.voice_count() {
            self.unison.set_voice_count(count as u8);
        }
        self.assign_voices(zone, pitch, velocity, count, false)
    }

    fn assign_voices(
        &mut self,
        zone: Zone,
        pitch: u8,
        velocity: u8,
        count: usize,
        synthetic: bool,
    ) -> Allocation {
        let mut allocation = Allocation::default();
        if pitch as usize >= NUM_PITCHES {
            return allocation;
        }

        let range = self.layout.voice_range(zone);
        if range.is_empty() {
            debug!(zone = zone.name(), pitch, "zone has no voices in this layout");
            allocation.dropped = count;
            return allocation;
        }

        // Re-press of a sounding pitch retriggers the voices it already owns.
        let existing = self.assignment[zone][pitch as usize];
        for (slot, voice) in existing.iter().enumerate() {
            if slot < count {
                self.emit(VoiceCommand::NoteOff { voice });
                self.start_voice(voice, zone, pitch, velocity, slot, count, synthetic);
                allocation.voices.insert(voice);
            } else {
                self.free_voice(voice);
            }
        }

        for slot in allocation.voices.len()..count {
            let voice = match self.find_free(range.clone()) {
                Some(voice) => voice,
                None => {
                    let claimed = allocation.voices;
                    let candidates = range
                        .clone()
                        .filter(|&i| !claimed.contains(i) && !self.voices[i].is_free())
                        .map(|i| (i, &self.voices[i]));

                    let victim = self.policies[zone].select(candidates);
                    match victim {
                        Some(victim) => {
                            let stolen = self.steal(victim);
                            allocation.stolen.push(stolen);
                            victim
                        }
                        None => {
                            allocation.dropped = count - slot;
                            debug!(
                                zone = zone.name(),
                                pitch,
                                dropped = allocation.dropped,
                                policy = self.policies[zone].name(),
                                "voice pool exhausted"
                            );
                            break;
                        }
                    }
                }
            };

            self.start_voice(voice, zone, pitch, velocity, slot, count, synthetic);
            allocation.voices.insert(voice);
        }

        allocation
    }

    /// Release `pitch` in `zone`.
    ///
    /// With `latched` the voices keep sounding and are marked sustained;
    /// otherwise they are silenced and freed. Unknown pitches are a no-op.
    pub fn release(&mut self, zone: Zone, pitch: u8, latched: bool) -> VoiceMask {
        let Some(&voices) = self.assignment[zone].get(pitch as usize) else {
            return VoiceMask::EMPTY;
        };

        for voice in voices.iter() {
            if latched {
                let slot = &mut self.voices[voice];
                slot.key_down = false;
                slot.sustained = true;
            } else {
                self.free_voice(voice);
            }
        }
        voices
    }

    /// Silence `pitch` regardless of any latch.
    pub fn force_release(&mut self, zone: Zone, pitch: u8) -> VoiceMask {
        self.release(zone, pitch, false)
    }

    /// Silence every voice owned by `zone`.
    pub fn release_zone(&mut self, zone: Zone) {
        for voice in 0..self.voices.len() {
            if self.voices[voice].zone == zone && !self.voices[voice].is_free() {
                self.free_voice(voice);
            }
        }
    }

    /// Silence every voice.
    pub fn all_notes_off(&mut self) {
        for voice in 0..self.voices.len() {
            if !self.voices[voice].is_free() {
                self.free_voice(voice);
            }
        }
    }

    /// Re-partition the pool. All voices are silenced first.
    pub fn set_layout(&mut self, layout: ZoneLayout) {
        self.all_notes_off();
        self.layout = ZoneLayout {
            total_voices: self.voices.len(),
            ..layout
        };
        debug!(
            mode = self.layout.mode.name(),
            split_point = self.layout.split_point,
            lower_voices = self.layout.lower_voices,
            "voice layout changed"
        );
    }

    pub fn layout(&self) -> &ZoneLayout {
        &self.layout
    }

    pub fn set_policy(&mut self, zone: Zone, policy: StealPolicy) {
        self.policies[zone] = policy;
    }

    pub fn policy(&self, zone: Zone) -> StealPolicy {
        self.policies[zone]
    }

    /// Octave shift and detune used for notes started from now on.
    pub fn set_zone_settings(&mut self, zone: Zone, settings: ZoneSettings) {
        self.settings[zone] = ZoneSettings {
            octave: settings.octave.clamp(-2, 2),
            ..settings
        };
    }

    pub fn zone_settings(&self, zone: Zone) -> ZoneSettings {
        self.settings[zone]
    }

    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.tuning = tuning;
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn set_unison_detune(&mut self, cents: f32) {
        self.unison.set_detune(cents);
    }

    pub fn unison(&self) -> &UnisonEngine {
        &self.unison
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn max_voices(&self) -> usize {
        self.voices.len()
    }

    /// Number of sounding voices owned by `zone`.
    pub fn active_count(&self, zone: Zone) -> usize {
        self.voices
            .iter()
            .filter(|v| v.zone == zone && !v.is_free())
            .count()
    }

    /// Voices currently sounding `pitch` in `zone`.
    pub fn sounding(&self, zone: Zone, pitch: u8) -> VoiceMask {
        self.assignment[zone]
            .get(pitch as usize)
            .copied()
            .unwrap_or_default()
    }

    #[inline]
    pub fn is_sounding(&self, zone: Zone, pitch: u8) -> bool {
        !self.sounding(zone, pitch).is_empty()
    }

    /// Drain queued commands in emission order.
    pub fn take_commands(&mut self) -> impl Iterator<Item = VoiceCommand> + '_ {
        self.commands.drain(..)
    }

    pub fn pending_commands(&self) -> &[VoiceCommand] {
        &self.commands
    }

    fn find_free(&self, range: core::ops::Range<usize>) -> Option<usize> {
        range.into_iter().find(|&i| self.voices[i].is_free())
    }

    fn steal(&mut self, voice: usize) -> StolenNote {
        let victim = self.voices[voice];
        let note = victim.note.unwrap_or_default();
        debug!(
            voice,
            zone = victim.zone.name(),
            note,
            key_down = victim.key_down,
            "stealing voice"
        );
        self.free_voice(voice);
        StolenNote {
            voice,
            zone: victim.zone,
            note,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn start_voice(
        &mut self,
        voice: usize,
        zone: Zone,
        pitch: u8,
        velocity: u8,
        slot: usize,
        count: usize,
        synthetic: bool,
    ) {
        let spread = if count > 1 { self.unison.ratio(slot) } else { 1.0 };
        let frequency = self.frequency(zone, pitch) * spread;
        let zone_position = self
            .layout
            .is_split()
            .then(|| voice - self.layout.voice_range(zone).start);

        self.counter += 1;
        self.voices[voice] = Voice {
            note: Some(pitch),
            zone,
            velocity,
            time_on: self.counter,
            sustained: false,
            key_down: true,
            frequency,
            zone_position,
            active: true,
            synthetic,
        };
        self.assignment[zone][pitch as usize].insert(voice);
        self.emit(VoiceCommand::NoteOn {
            voice,
            frequency,
            velocity,
        });
    }

    fn free_voice(&mut self, voice: usize) {
        let slot = self.voices[voice];
        if let Some(note) = slot.note {
            self.assignment[slot.zone][note as usize].remove(voice);
            self.emit(VoiceCommand::NoteOff { voice });
        }
        self.voices[voice] = Voice::default();
    }

    fn frequency(&self, zone: Zone, pitch: u8) -> f32 {
        let settings = self.settings[zone];
        let shifted = pitch as i16 + settings.octave as i16 * 12;
        self.tuning.shifted_freq(shifted) * cents_to_ratio(settings.detune_cents)
    }

    fn emit(&mut self, command: VoiceCommand) {
        trace!(?command, "voice command");
        self.commands.push(command);
    }
}

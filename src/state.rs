//! Mutable performance state owned by the poll loop.

use polykey_arp::Arpeggiator;
use polykey_synth::{
    HoldLatch, KeyMode, NoteRegistry, PerZone, VoiceAllocator, Zone, ZoneLayout, ZoneSettings,
};

/// Every piece of state the engine mutates, in one place.
///
/// Zone-scoped parameters are stored as [`PerZone`] values rather than
/// separate upper/lower fields. Hosts get read-only access through
/// [`PerformanceEngine::state`](crate::PerformanceEngine::state).
pub struct PerformanceState {
    pub(crate) registry: NoteRegistry,
    pub(crate) voices: VoiceAllocator,
    pub(crate) hold: HoldLatch,
    pub(crate) arp: Arpeggiator,
    pub(crate) layout: ZoneLayout,

    /// Voices stacked per key in unison mode
    pub(crate) unison_voices: usize,
    /// Pitch holding the unison stack
    pub(crate) unison_note: Option<u8>,

    pub(crate) octaves: PerZone<i8>,
    pub(crate) dual_detune_cents: f32,
}

impl PerformanceState {
    pub fn registry(&self) -> &NoteRegistry {
        &self.registry
    }

    pub fn voices(&self) -> &VoiceAllocator {
        &self.voices
    }

    pub fn hold(&self) -> &HoldLatch {
        &self.hold
    }

    pub fn arp(&self) -> &Arpeggiator {
        &self.arp
    }

    pub fn layout(&self) -> &ZoneLayout {
        &self.layout
    }

    pub fn key_mode(&self) -> KeyMode {
        self.layout.mode
    }

    /// Zone the arpeggiator reads from in the current layout.
    pub fn arp_zone(&self) -> Zone {
        self.layout.mode.arp_zone()
    }

    pub fn unison_voices(&self) -> usize {
        self.unison_voices
    }

    /// Pitch currently sounding the unison stack, if it still sounds.
    pub fn unison_note(&self) -> Option<u8> {
        self.unison_note
            .filter(|&pitch| self.voices.is_sounding(Zone::Whole, pitch))
    }

    pub fn octave(&self, zone: Zone) -> i8 {
        self.octaves[zone]
    }

    pub fn dual_detune_cents(&self) -> f32 {
        self.dual_detune_cents
    }

    /// Push octave shifts and the dual-layer detune down to the allocator.
    pub(crate) fn apply_zone_settings(&mut self) {
        for zone in Zone::ALL {
            let detune_cents = if self.layout.mode == KeyMode::Dual && zone == Zone::Upper {
                self.dual_detune_cents
            } else {
                0.0
            };
            self.voices.set_zone_settings(
                zone,
                ZoneSettings {
                    octave: self.octaves[zone],
                    detune_cents,
                },
            );
        }
    }
}

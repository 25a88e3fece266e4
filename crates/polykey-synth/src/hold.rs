//! Sustain pedal and manual hold.
//!
//! While hold is active for a zone, key releases latch the pitch instead of
//! silencing it. Dropping hold releases every latched pitch in ascending
//! order. Arpeggiator notes never pass through here.

use tracing::debug;

use crate::voice::{StolenNote, VoiceAllocator};
use crate::zone::{PerZone, Zone, NUM_PITCHES};

#[derive(Debug, Clone)]
struct HoldZone {
    manual: bool,
    pedal: bool,
    latched: [bool; NUM_PITCHES],
    latched_count: usize,
}

impl Default for HoldZone {
    fn default() -> Self {
        Self {
            manual: false,
            pedal: false,
            latched: [false; NUM_PITCHES],
            latched_count: 0,
        }
    }
}

impl HoldZone {
    #[inline]
    fn is_active(&self) -> bool {
        self.manual || self.pedal
    }

    fn set_latched(&mut self, pitch: usize, on: bool) {
        if self.latched[pitch] != on {
            self.latched[pitch] = on;
            if on {
                self.latched_count += 1;
            } else {
                self.latched_count -= 1;
            }
        }
    }
}

/// Per-zone hold state.
#[derive(Debug, Clone, Default)]
pub struct HoldLatch {
    zones: PerZone<HoldZone>,
}

impl HoldLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold is active when either the pedal or the manual toggle is on.
    #[inline]
    pub fn is_active(&self, zone: Zone) -> bool {
        self.zones[zone].is_active()
    }

    pub fn pedal(&self, zone: Zone) -> bool {
        self.zones[zone].pedal
    }

    pub fn manual(&self, zone: Zone) -> bool {
        self.zones[zone].manual
    }

    pub fn on_pedal_change(&mut self, zone: Zone, down: bool, alloc: &mut VoiceAllocator) {
        let manual = self.zones[zone].manual;
        self.update(zone, manual, down, alloc);
    }

    pub fn on_manual_hold_toggle(&mut self, zone: Zone, alloc: &mut VoiceAllocator) {
        let on = !self.zones[zone].manual;
        self.set_manual(zone, on, alloc);
    }

    pub fn set_manual(&mut self, zone: Zone, on: bool, alloc: &mut VoiceAllocator) {
        let pedal = self.zones[zone].pedal;
        self.update(zone, on, pedal, alloc);
    }

    fn update(&mut self, zone: Zone, manual: bool, pedal: bool, alloc: &mut VoiceAllocator) {
        let was_active = self.zones[zone].is_active();
        self.zones[zone].manual = manual;
        self.zones[zone].pedal = pedal;

        if was_active && !self.zones[zone].is_active() {
            let released = self.release_all_latched(zone, alloc);
            debug!(zone = zone.name(), released, "hold off");
        } else if !was_active && self.zones[zone].is_active() {
            debug!(zone = zone.name(), manual, pedal, "hold on");
        }
    }

    /// A key went down. Returns whether it had been latched; the allocator
    /// retriggers the voice on the following assignment.
    pub fn on_key_down(&mut self, zone: Zone, pitch: u8) -> bool {
        let Some(index) = pitch_index(pitch) else {
            return false;
        };
        let hold = &mut self.zones[zone];
        let was_latched = hold.latched[index];
        hold.set_latched(index, false);
        was_latched
    }

    /// A key went up. Latches the pitch if hold is active and a voice is
    /// sounding it, otherwise releases it. Returns whether it was latched.
    pub fn on_key_up(&mut self, zone: Zone, pitch: u8, alloc: &mut VoiceAllocator) -> bool {
        let Some(index) = pitch_index(pitch) else {
            return false;
        };

        if self.zones[zone].is_active() && alloc.is_sounding(zone, pitch) {
            self.zones[zone].set_latched(index, true);
            alloc.release(zone, pitch, true);
            true
        } else {
            alloc.release(zone, pitch, false);
            false
        }
    }

    /// Release every latched pitch in `zone`, lowest first. Returns how many
    /// pitches were released.
    pub fn release_all_latched(&mut self, zone: Zone, alloc: &mut VoiceAllocator) -> usize {
        let hold = &mut self.zones[zone];
        if hold.latched_count == 0 {
            return 0;
        }

        let mut released = 0;
        for pitch in 0..NUM_PITCHES {
            if hold.latched[pitch] {
                hold.set_latched(pitch, false);
                alloc.release(zone, pitch as u8, false);
                released += 1;
            }
        }
        released
    }

    /// Drop the latch flag for `pitch` without touching its voice.
    pub fn forget(&mut self, zone: Zone, pitch: u8) {
        if let Some(index) = pitch_index(pitch) {
            self.zones[zone].set_latched(index, false);
        }
    }

    /// Drop latch flags for notes that lost their last voice to a steal.
    pub fn forget_stolen(&mut self, stolen: &[StolenNote], alloc: &VoiceAllocator) {
        for note in stolen {
            if !alloc.is_sounding(note.zone, note.note) {
                self.forget(note.zone, note.note);
            }
        }
    }

    pub fn is_latched(&self, zone: Zone, pitch: u8) -> bool {
        pitch_index(pitch).is_some_and(|i| self.zones[zone].latched[i])
    }

    pub fn latched_count(&self, zone: Zone) -> usize {
        self.zones[zone].latched_count
    }

    /// Latched pitches in ascending order.
    pub fn latched_pitches(&self, zone: Zone) -> impl Iterator<Item = u8> + '_ {
        let hold = &self.zones[zone];
        (0..NUM_PITCHES as u8).filter(move |&p| hold.latched[p as usize])
    }

    /// Clear latch flags in `zone` without releasing voices. Pedal and
    /// manual state are kept.
    pub fn clear_latched(&mut self, zone: Zone) {
        let hold = &mut self.zones[zone];
        hold.latched = [false; NUM_PITCHES];
        hold.latched_count = 0;
    }

    pub fn clear_all_latched(&mut self) {
        for zone in Zone::ALL {
            self.clear_latched(zone);
        }
    }
}

#[inline]
fn pitch_index(pitch: u8) -> Option<usize> {
    let index = pitch as usize;
    (index < NUM_PITCHES).then_some(index)
}

//! Physical key state and press order, per zone.
//!
//! The registry only records what the player's hands are doing. Sustain,
//! latching and arpeggiator notes never touch it.

use crate::zone::{PerZone, Zone, NUM_PITCHES};

/// Capacity of a press-order queue. Re-pressing a pitch removes its older
/// entry, so the queue holds at most one entry per pitch and never overflows.
pub const PRESS_ORDER_CAPACITY: usize = NUM_PITCHES;

/// Bounded press-order queue (oldest first) with an explicit occupancy count.
/// Backed by a fixed array; removal shifts later entries down.
///
/// Entries for keys that have since been released are left in place and
/// skipped by lookups; they are dropped when the pitch is pressed again or
/// when the zone has no keys down.
#[derive(Debug, Clone)]
pub struct PressOrder {
    buf: [u8; PRESS_ORDER_CAPACITY],
    len: usize,
}

impl Default for PressOrder {
    fn default() -> Self {
        Self {
            buf: [0; PRESS_ORDER_CAPACITY],
            len: 0,
        }
    }
}

impl PressOrder {
    /// Append `pitch` as the newest entry.
    pub fn push(&mut self, pitch: u8) {
        self.remove(pitch);

        if self.len == PRESS_ORDER_CAPACITY {
            // Unreachable with one entry per pitch; drop the oldest anyway.
            self.buf.copy_within(1.., 0);
            self.len -= 1;
        }

        self.buf[self.len] = pitch;
        self.len += 1;
    }

    /// Remove the entry for `pitch`, closing the gap. Returns whether it was present.
    pub fn remove(&mut self, pitch: u8) -> bool {
        let Some(found) = self.buf[..self.len].iter().position(|&p| p == pitch) else {
            return false;
        };
        self.buf.copy_within(found + 1..self.len, found);
        self.len -= 1;
        true
    }

    /// Entries from newest to oldest.
    pub fn iter_newest(&self) -> impl Iterator<Item = u8> + '_ {
        self.buf[..self.len].iter().rev().copied()
    }

    /// Entries from oldest to newest.
    pub fn iter_oldest(&self) -> impl Iterator<Item = u8> + '_ {
        self.buf[..self.len].iter().copied()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

/// Key state for one zone.
#[derive(Debug, Clone)]
pub struct ZoneKeys {
    down: [bool; NUM_PITCHES],
    velocity: [u8; NUM_PITCHES],
    order: PressOrder,
    held: usize,
}

impl Default for ZoneKeys {
    fn default() -> Self {
        Self {
            down: [false; NUM_PITCHES],
            velocity: [0; NUM_PITCHES],
            order: PressOrder::default(),
            held: 0,
        }
    }
}

/// Per-zone key-state tables and press-order queues.
#[derive(Debug, Clone, Default)]
pub struct NoteRegistry {
    zones: PerZone<ZoneKeys>,
}

impl NoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press. Returns `false` if the key was already down.
    pub fn key_down(&mut self, zone: Zone, pitch: u8, velocity: u8) -> bool {
        let Some(index) = pitch_index(pitch) else {
            return false;
        };
        let keys = &mut self.zones[zone];

        keys.order.push(pitch);
        keys.velocity[index] = velocity;
        if keys.down[index] {
            return false;
        }
        keys.down[index] = true;
        keys.held += 1;
        true
    }

    /// Record a key release. Returns `false` if the key was not down.
    pub fn key_up(&mut self, zone: Zone, pitch: u8) -> bool {
        let Some(index) = pitch_index(pitch) else {
            return false;
        };
        let keys = &mut self.zones[zone];

        if !keys.down[index] {
            return false;
        }
        keys.down[index] = false;
        keys.held -= 1;
        if keys.held == 0 {
            keys.order.clear();
        }
        true
    }

    #[inline]
    pub fn is_down(&self, zone: Zone, pitch: u8) -> bool {
        pitch_index(pitch).is_some_and(|i| self.zones[zone].down[i])
    }

    #[inline]
    pub fn held_count(&self, zone: Zone) -> usize {
        self.zones[zone].held
    }

    /// Held pitches in ascending order.
    pub fn held_pitches(&self, zone: Zone) -> impl Iterator<Item = u8> + Clone + '_ {
        let keys = &self.zones[zone];
        (0..NUM_PITCHES as u8).filter(move |&p| keys.down[p as usize])
    }

    /// Most recently pressed key that is still down ("last note" priority).
    pub fn last_pressed(&self, zone: Zone) -> Option<u8> {
        let keys = &self.zones[zone];
        keys.order
            .iter_newest()
            .find(|&p| keys.down[p as usize])
    }

    /// Velocity of the most recent press of `pitch`.
    pub fn velocity(&self, zone: Zone, pitch: u8) -> u8 {
        pitch_index(pitch).map_or(0, |i| self.zones[zone].velocity[i])
    }

    pub fn press_order(&self, zone: Zone) -> &PressOrder {
        &self.zones[zone].order
    }

    pub fn clear(&mut self, zone: Zone) {
        self.zones[zone] = ZoneKeys::default();
    }

    pub fn clear_all(&mut self) {
        for zone in Zone::ALL {
            self.clear(zone);
        }
    }
}

#[inline]
fn pitch_index(pitch: u8) -> Option<usize> {
    let index = pitch as usize;
    (index < NUM_PITCHES).then_some(index)
}

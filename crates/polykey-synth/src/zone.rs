//! Keyboard zones, zone-scoped storage and the key/voice layout.

use core::ops::{Index, IndexMut, Range};

use serde::{Deserialize, Serialize};

/// Number of MIDI pitches tracked per zone.
pub const NUM_PITCHES: usize = 128;

/// A keyboard partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Zone {
    /// Whole keyboard (single and unison modes)
    #[default]
    Whole,
    /// Left of the split point / first dual layer
    Lower,
    /// Right of the split point / second dual layer
    Upper,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::Whole, Zone::Lower, Zone::Upper];

    pub fn name(&self) -> &'static str {
        match self {
            Zone::Whole => "Whole",
            Zone::Lower => "Lower",
            Zone::Upper => "Upper",
        }
    }
}

/// Keyboard configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyMode {
    /// One zone, full polyphony
    #[default]
    Whole,
    /// Keys below the split point play Lower, the rest Upper
    Split,
    /// Every key plays both Lower and Upper
    Dual,
    /// One zone, every key press stacks detuned voices
    Unison,
}

impl KeyMode {
    /// Zones that own voices in this mode.
    pub fn zones(&self) -> &'static [Zone] {
        match self {
            KeyMode::Whole | KeyMode::Unison => &[Zone::Whole],
            KeyMode::Split | KeyMode::Dual => &[Zone::Lower, Zone::Upper],
        }
    }

    /// Zone the arpeggiator reads from.
    pub fn arp_zone(&self) -> Zone {
        match self {
            KeyMode::Whole | KeyMode::Unison => Zone::Whole,
            KeyMode::Split | KeyMode::Dual => Zone::Lower,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KeyMode::Whole => "Whole",
            KeyMode::Split => "Split",
            KeyMode::Dual => "Dual",
            KeyMode::Unison => "Unison",
        }
    }
}

/// One value per zone, replacing parallel upper/lower variables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerZone<T> {
    pub whole: T,
    pub lower: T,
    pub upper: T,
}

impl<T: Clone> PerZone<T> {
    pub fn splat(value: T) -> Self {
        Self {
            whole: value.clone(),
            lower: value.clone(),
            upper: value,
        }
    }
}

impl<T> PerZone<T> {
    pub fn iter(&self) -> impl Iterator<Item = (Zone, &T)> {
        [
            (Zone::Whole, &self.whole),
            (Zone::Lower, &self.lower),
            (Zone::Upper, &self.upper),
        ]
        .into_iter()
    }
}

impl<T> Index<Zone> for PerZone<T> {
    type Output = T;

    fn index(&self, zone: Zone) -> &T {
        match zone {
            Zone::Whole => &self.whole,
            Zone::Lower => &self.lower,
            Zone::Upper => &self.upper,
        }
    }
}

impl<T> IndexMut<Zone> for PerZone<T> {
    fn index_mut(&mut self, zone: Zone) -> &mut T {
        match zone {
            Zone::Whole => &mut self.whole,
            Zone::Lower => &mut self.lower,
            Zone::Upper => &mut self.upper,
        }
    }
}

/// Per-zone sound settings applied when computing voice frequency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSettings {
    /// Octave transposition, -2..=2
    pub octave: i8,
    /// Fine detune in cents (dual-mode layer detune)
    pub detune_cents: f32,
}

/// How keys and voices are distributed over zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneLayout {
    pub mode: KeyMode,
    /// First pitch of the Upper zone in split mode
    pub split_point: u8,
    /// Voices owned by Lower in split/dual; Upper owns the rest
    pub lower_voices: usize,
    pub total_voices: usize,
}

impl ZoneLayout {
    pub fn new(mode: KeyMode, total_voices: usize) -> Self {
        Self {
            mode,
            split_point: 60,
            lower_voices: total_voices / 2,
            total_voices,
        }
    }

    /// Zones a physical key press is routed to.
    pub fn route(&self, pitch: u8) -> &'static [Zone] {
        match self.mode {
            KeyMode::Whole | KeyMode::Unison => &[Zone::Whole],
            KeyMode::Split if pitch < self.split_point => &[Zone::Lower],
            KeyMode::Split => &[Zone::Upper],
            KeyMode::Dual => &[Zone::Lower, Zone::Upper],
        }
    }

    /// Voice indices owned by `zone`. Empty if the zone is unused in this mode.
    pub fn voice_range(&self, zone: Zone) -> Range<usize> {
        let lower = self.lower_voices.min(self.total_voices);
        match (self.mode, zone) {
            (KeyMode::Whole | KeyMode::Unison, Zone::Whole) => 0..self.total_voices,
            (KeyMode::Split | KeyMode::Dual, Zone::Lower) => 0..lower,
            (KeyMode::Split | KeyMode::Dual, Zone::Upper) => lower..self.total_voices,
            _ => 0..0,
        }
    }

    /// Pool size available to `zone`.
    pub fn pool_size(&self, zone: Zone) -> usize {
        self.voice_range(zone).len()
    }

    pub fn is_split(&self) -> bool {
        matches!(self.mode, KeyMode::Split | KeyMode::Dual)
    }
}

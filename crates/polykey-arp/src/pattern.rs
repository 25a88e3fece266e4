//! Held-note pattern unfolded across the octave range.

use polykey_synth::NUM_PITCHES;

pub const MIN_RANGE: u8 = 1;
pub const MAX_RANGE: u8 = 4;

/// Upper bound on pattern length: every pitch in every octave replica.
pub const MAX_PATTERN_LEN: usize = NUM_PITCHES * MAX_RANGE as usize;

/// Note sequence walked by the sequencer, one ascending replica per octave.
///
/// Every pitch appears at most once. Storage is reserved once; rebuilding
/// never allocates.
#[derive(Debug, Clone)]
pub struct ArpPattern {
    notes: Vec<u8>,
}

impl Default for ArpPattern {
    fn default() -> Self {
        Self::new()
    }
}

impl ArpPattern {
    pub fn new() -> Self {
        Self {
            notes: Vec::with_capacity(MAX_PATTERN_LEN),
        }
    }

    /// Replace the pattern with `held` (ascending) repeated once per octave of
    /// `range`, each replica 12 semitones above the last. Pitches above 127
    /// are dropped, as are replica pitches already in the pattern (held keys
    /// an octave apart).
    pub fn rebuild(&mut self, held: impl Iterator<Item = u8> + Clone, range: u8) {
        self.notes.clear();
        let mut seen: u128 = 0;
        for octave in 0..range.clamp(MIN_RANGE, MAX_RANGE) as u16 {
            for pitch in held.clone() {
                let shifted = pitch as u16 + octave * 12;
                if shifted >= NUM_PITCHES as u16 {
                    continue;
                }
                let bit = 1u128 << shifted;
                if seen & bit == 0 {
                    seen |= bit;
                    self.notes.push(shifted as u8);
                }
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        self.notes.get(index).copied()
    }

    pub fn position_of(&self, pitch: u8) -> Option<usize> {
        self.notes.iter().position(|&p| p == pitch)
    }

    pub fn notes(&self) -> &[u8] {
        &self.notes
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

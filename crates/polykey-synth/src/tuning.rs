//! Pitch-to-frequency conversion for voice commands.
//!
//! Pre-computes a 128-note equal-temperament table so that voice assignment
//! never calls `powf` on the hot path except for detune ratios.

/// Reference pitch for A4.
pub const A4_FREQ: f32 = 440.0;

/// MIDI note number for A4.
pub const A4_NOTE: u8 = 69;

/// Frequency ratio for a detune amount in cents.
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    2.0_f32.powf(cents / 1200.0)
}

/// 12-TET frequency lookup with a configurable reference.
#[derive(Debug, Clone)]
pub struct Tuning {
    freq_table: [f32; 128],
    reference_freq: f32,
    reference_note: u8,
}

impl Tuning {
    pub fn equal_temperament() -> Self {
        Self::equal_temperament_with_reference(A4_FREQ, A4_NOTE)
    }

    pub fn equal_temperament_with_reference(reference_freq: f32, reference_note: u8) -> Self {
        let mut tuning = Self {
            freq_table: [0.0; 128],
            reference_freq,
            reference_note,
        };
        tuning.recompute_table();
        tuning
    }

    fn recompute_table(&mut self) {
        for note in 0..128 {
            let semitones = note as f32 - self.reference_note as f32;
            self.freq_table[note] = self.reference_freq * 2.0_f32.powf(semitones / 12.0);
        }
    }

    /// RT-safe: simple array lookup.
    #[inline]
    pub fn note_to_freq(&self, note: u8) -> f32 {
        self.freq_table[(note as usize).min(127)]
    }

    /// Frequency for a pitch that may have been shifted outside 0..=127 by
    /// octave transposition. Out-of-range pitches fold by octaves into the
    /// table and are scaled back.
    pub fn shifted_freq(&self, pitch: i16) -> f32 {
        let mut pitch = pitch;
        let mut scale = 1.0;
        while pitch > 127 {
            pitch -= 12;
            scale *= 2.0;
        }
        while pitch < 0 {
            pitch += 12;
            scale *= 0.5;
        }
        self.freq_table[pitch as usize] * scale
    }

    pub fn set_reference(&mut self, freq: f32, note: u8) {
        self.reference_freq = freq;
        self.reference_note = note;
        self.recompute_table();
    }

    pub fn reference_freq(&self) -> f32 {
        self.reference_freq
    }

    pub fn reference_note(&self) -> u8 {
        self.reference_note
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self::equal_temperament()
    }
}

//! Tolerance constants for frequency and timing checks.

/// Frequencies from the 12-TET table (computed in f32).
pub const FREQ_EPSILON: f32 = 0.01;

/// Detuned or spread frequencies that go through an extra cents conversion.
pub const DETUNE_EPSILON: f32 = 0.05;

//! Error types for polykey-core.

use thiserror::Error;

/// Error type for polykey-core configuration.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid arpeggiator rate: {0} Hz. Must be between 0.1 and 100.0 Hz")]
    InvalidRate(f32),

    #[error("Invalid MIDI clock division: {0} ticks per step")]
    InvalidDivision(u32),
}

/// Result type for polykey-core operations.
pub type Result<T> = std::result::Result<T, Error>;

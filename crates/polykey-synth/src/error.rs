//! Error types for polykey-synth.

use thiserror::Error;

/// Result type alias for polykey-synth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring voice allocation.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Voice pool larger than the allocator can track.
    #[error("Voice pool of {requested} exceeds the maximum of {max}")]
    TooManyVoices { requested: usize, max: usize },

    /// Split point outside the MIDI pitch range.
    #[error("Split point {0} is not a valid MIDI pitch")]
    InvalidSplitPoint(u8),
}

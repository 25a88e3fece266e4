//! Error types for polykey-arp.

use thiserror::Error;

/// Result type alias for polykey-arp operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Octave range outside 1-4.
    #[error("Arpeggiator range {0} is outside 1-4 octaves")]
    InvalidRange(u8),
}

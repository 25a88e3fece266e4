//! Centralized error type for the polykey umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] polykey_core::Error),

    #[error("Voices: {0}")]
    Synth(#[from] polykey_synth::Error),

    #[error("Arpeggiator: {0}")]
    Arp(#[from] polykey_arp::Error),

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

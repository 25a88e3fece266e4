//! Real-time plumbing for the polykey performance engine.
//!
//! # Primary API
//!
//! - [`ClockMultiplexer`]: Selects and drains the arpeggiator step source
//! - [`ClockInputs`]: Interrupt-safe handle for clock pulses and MIDI transport
//! - [`SmoothedRate`]: Elapsed-time one-pole smoothing for control values
//! - [`TickCounter`] / [`CounterCursor`]: Drain-since-last-observed counters
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use polykey_core::{ClockConfig, ClockInputs, ClockMultiplexer, ClockSource};
//!
//! let config = ClockConfig { source: ClockSource::External, ..Default::default() };
//! let inputs = Arc::new(ClockInputs::new(config.rate_hz, config.min_pulse_spacing_us));
//! let mut clock = ClockMultiplexer::new(&config, Arc::clone(&inputs));
//!
//! // From the clock-in interrupt
//! inputs.on_external_clock_pulse(1_000);
//!
//! // From the poll loop
//! assert_eq!(clock.poll(1_200).steps, 1);
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod clock;
pub use clock::{
    ClockInputs, ClockMultiplexer, ClockPoll, ClockSource, ExternalStatus, MidiDivision,
    MidiTransport, MIDI_PPQN,
};

mod config;
pub use config::{ClockConfig, MAX_RATE_HZ, MIN_RATE_HZ};

pub(crate) mod lockfree;
pub use lockfree::{AtomicFlag, AtomicFloat, CounterCursor, TickCounter};

mod smooth;
pub use smooth::SmoothedRate;

/// Monotonic microsecond timestamp. Wraps; compare with `wrapping_sub`.
pub type Micros = u32;

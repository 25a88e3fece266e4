//! # polykey - Polyphonic Performance Core
//!
//! Note-event and voice engine for a multi-zone, MIDI-driven instrument.
//!
//! ## Architecture
//!
//! polykey is an umbrella crate that coordinates:
//! - **polykey-core** - Clock inputs and multiplexer (internal, external pulse, MIDI clock)
//! - **polykey-synth** - Note registry, zone layout, voice allocation, hold latch
//! - **polykey-arp** - Arpeggiator sequencer
//!
//! Key and pedal events flow through the note registry and hold latch into
//! the voice allocator. Clock steps drive the arpeggiator, which reads the
//! held notes of its zone and sounds synthesized notes through the same
//! allocator. Everything is emitted as abstract voice commands through
//! [`EngineOutput`].
//!
//! ## Quick Start
//!
//! ```
//! use polykey::prelude::*;
//!
//! #[derive(Default)]
//! struct Voices(Vec<String>);
//!
//! impl EngineOutput for Voices {
//!     fn voice_note_on(&mut self, voice: usize, frequency: f32, _velocity: u8) {
//!         self.0.push(format!("on {voice} {frequency:.0}"));
//!     }
//!
//!     fn voice_note_off(&mut self, voice: usize) {
//!         self.0.push(format!("off {voice}"));
//!     }
//! }
//!
//! let mut engine = PerformanceEngine::builder().voices(4).build()?;
//!
//! // The clock interrupt and MIDI callback share this handle
//! let clock = engine.clock_inputs();
//! clock.on_midi_start();
//!
//! engine.on_key_event(Zone::Whole, 69, true, 100);
//!
//! let mut out = Voices::default();
//! engine.poll(0, &mut out);
//! assert_eq!(out.0, vec!["on 0 440"]);
//! # Ok::<(), polykey::Error>(())
//! ```

/// Re-export of polykey-core for direct access
pub use polykey_core as core;

/// Re-export of polykey-synth for direct access
pub use polykey_synth as synth;

/// Re-export of polykey-arp for direct access
pub use polykey_arp as arp;

pub use polykey_core::{
    ClockInputs, ClockSource, ExternalStatus, Micros, MidiDivision, MidiTransport,
};

pub use polykey_synth::{
    HoldLatch, KeyMode, NoteRegistry, PerZone, StealPolicy, Voice, VoiceAllocator, VoiceCommand,
    Zone, ZoneLayout,
};

pub use polykey_arp::{ArpMode, ArpState, ArpVelocity, Arpeggiator};

mod error;
pub use error::{Error, Result};

mod builder;
mod config;
mod engine;
mod output;
mod state;

pub use builder::EngineBuilder;
pub use config::{EngineConfig, DEFAULT_SPLIT_POINT};
pub use engine::PerformanceEngine;
pub use output::{EngineEvent, EngineOutput};
pub use state::PerformanceState;

/// Convenience prelude for common imports
pub mod prelude {
    // Main engine
    pub use crate::{EngineBuilder, EngineConfig, PerformanceEngine};

    // Output
    pub use crate::{EngineEvent, EngineOutput};

    // Keyboard
    pub use crate::{KeyMode, StealPolicy, Zone};

    // Arpeggiator and clock
    pub use crate::{ArpMode, ArpVelocity, ClockSource, MidiDivision, MidiTransport};
}

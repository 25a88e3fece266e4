//! Note and voice management for polykey.
//!
//! - **[`NoteRegistry`]** - Per-zone key state and press order
//! - **[`VoiceAllocator`]** - Zone-partitioned voice pool with stealing
//! - **[`StealPolicy`]** - Per-zone steal comparator hook
//! - **[`HoldLatch`]** - Sustain pedal and manual hold
//! - **[`ZoneLayout`]** - Whole, split, dual and unison key routing
//! - **[`Tuning`]** / **[`UnisonEngine`]** - Voice frequency and detune spread
//!
//! # Quick Start
//!
//! ```
//! use polykey_synth::{HoldLatch, NoteRegistry, VoiceAllocator, VoiceAllocatorConfig, Zone};
//!
//! let mut registry = NoteRegistry::new();
//! let mut latch = HoldLatch::new();
//! let mut voices = VoiceAllocator::new(VoiceAllocatorConfig::default());
//!
//! registry.key_down(Zone::Whole, 60, 100);
//! latch.on_key_down(Zone::Whole, 60);
//! let allocation = voices.assign(Zone::Whole, 60, 100);
//! assert_eq!(allocation.voice(), Some(0));
//!
//! latch.on_pedal_change(Zone::Whole, true, &mut voices);
//! registry.key_up(Zone::Whole, 60);
//! assert!(latch.on_key_up(Zone::Whole, 60, &mut voices));
//!
//! for command in voices.take_commands() {
//!     println!("{command:?}");
//! }
//! ```

pub mod error;
pub use error::{Error, Result};

mod voice;

pub use voice::{
    Allocation, StolenNote, Voice, VoiceAllocator, VoiceAllocatorConfig, VoiceCommand,
    VoiceMask, MAX_VOICES,
};

mod policy;

pub use policy::{StealPolicy, VoiceComparator};

mod registry;

pub use registry::{NoteRegistry, PressOrder, PRESS_ORDER_CAPACITY};

mod hold;

pub use hold::HoldLatch;

mod zone;

pub use zone::{KeyMode, PerZone, Zone, ZoneLayout, ZoneSettings, NUM_PITCHES};

mod tuning;

pub use tuning::{cents_to_ratio, Tuning, A4_FREQ, A4_NOTE};

mod unison;

pub use unison::{UnisonConfig, UnisonEngine, MAX_UNISON_VOICES};

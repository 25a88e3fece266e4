//! Arpeggiator for polykey.
//!
//! [`Arpeggiator`] walks the held notes of one zone, unfolded over 1-4
//! octaves, and sounds one note per clock step through the voice allocator.
//!
//! ```
//! use polykey_arp::{ArpConfig, ArpMode, Arpeggiator};
//! use polykey_synth::{NoteRegistry, VoiceAllocator, VoiceAllocatorConfig, Zone};
//!
//! let mut registry = NoteRegistry::new();
//! let mut voices = VoiceAllocator::new(VoiceAllocatorConfig::default());
//! let mut arp = Arpeggiator::new(ArpConfig { mode: ArpMode::Up, ..Default::default() });
//!
//! registry.key_down(Zone::Whole, 64, 100);
//! registry.key_down(Zone::Whole, 60, 100);
//! arp.sync(registry.held_count(Zone::Whole), &mut voices);
//!
//! let first = arp.step(&registry, Zone::Whole, &mut voices).map(|s| s.pitch);
//! let second = arp.step(&registry, Zone::Whole, &mut voices).map(|s| s.pitch);
//! assert_eq!((first, second), (Some(60), Some(64)));
//! ```

pub mod error;
pub use error::{Error, Result};

mod mode;
pub use mode::ArpMode;

mod pattern;
pub use pattern::{ArpPattern, MAX_PATTERN_LEN, MAX_RANGE, MIN_RANGE};

mod sequencer;
pub use sequencer::{ArpConfig, ArpState, ArpStep, ArpTransition, ArpVelocity, Arpeggiator};

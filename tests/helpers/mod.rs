//! Test helpers and fixtures for polykey integration tests
//!
//! The engine is driven with explicit timestamps and a [`Recorder`] output,
//! so every test controls the clock and sees the exact command stream.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FREQ_EPSILON` (0.01 Hz): Plain tuning table lookups
//! - `DETUNE_EPSILON` (0.05 Hz): Dual detune and unison spread

#![allow(dead_code)]

pub mod tolerances;

use std::collections::BTreeSet;

use polykey::prelude::*;
use polykey::Micros;

pub use tolerances::*;

/// Internal clock rate used by arpeggiator tests: one step every 100 ms.
pub const TEST_RATE_HZ: f32 = 10.0;
pub const STEP_US: Micros = 100_000;

pub const C4: u8 = 60;
pub const E4: u8 = 64;
pub const G4: u8 = 67;
pub const A4: u8 = 69;

/// One voice command as received by the output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    On {
        voice: usize,
        frequency: f32,
        velocity: u8,
    },
    Off {
        voice: usize,
    },
}

/// Records everything the engine emits.
#[derive(Debug, Default)]
pub struct Recorder {
    pub commands: Vec<Command>,
    pub events: Vec<EngineEvent>,
}

impl EngineOutput for Recorder {
    fn voice_note_on(&mut self, voice: usize, frequency: f32, velocity: u8) {
        self.commands.push(Command::On {
            voice,
            frequency,
            velocity,
        });
    }

    fn voice_note_off(&mut self, voice: usize) {
        self.commands.push(Command::Off { voice });
    }

    fn telemetry(&mut self, event: EngineEvent) {
        self.events.push(event);
    }
}

impl Recorder {
    pub fn clear(&mut self) {
        self.commands.clear();
        self.events.clear();
    }

    pub fn note_ons(&self) -> Vec<usize> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::On { voice, .. } => Some(*voice),
                Command::Off { .. } => None,
            })
            .collect()
    }

    pub fn note_offs(&self) -> Vec<usize> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Off { voice } => Some(*voice),
                Command::On { .. } => None,
            })
            .collect()
    }

    pub fn frequencies(&self) -> Vec<f32> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::On { frequency, .. } => Some(*frequency),
                Command::Off { .. } => None,
            })
            .collect()
    }

    /// Pitches sounded by the arpeggiator, in step order.
    pub fn arp_pitches(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::ArpStep { pitch, .. } => Some(*pitch),
                _ => None,
            })
            .collect()
    }

    pub fn saw(&self, event: EngineEvent) -> bool {
        self.events.contains(&event)
    }

    /// Voices left sounding after replaying the command stream.
    pub fn sounding(&self) -> BTreeSet<usize> {
        let mut sounding = BTreeSet::new();
        for command in &self.commands {
            match command {
                Command::On { voice, .. } => {
                    sounding.insert(*voice);
                }
                Command::Off { voice } => {
                    sounding.remove(voice);
                }
            }
        }
        sounding
    }
}

/// Engine plus a manually advanced clock.
pub struct Rig {
    pub engine: PerformanceEngine,
    pub now: Micros,
    pub out: Recorder,
}

impl Rig {
    pub fn new(engine: PerformanceEngine) -> Self {
        Self {
            engine,
            now: 0,
            out: Recorder::default(),
        }
    }

    pub fn press(&mut self, pitch: u8) {
        self.engine.on_key_event(Zone::Whole, pitch, true, 100);
    }

    pub fn release(&mut self, pitch: u8) {
        self.engine.on_key_event(Zone::Whole, pitch, false, 0);
    }

    /// Poll at the current time without advancing.
    pub fn poll(&mut self) {
        self.engine.poll(self.now, &mut self.out);
    }

    /// Advance the clock by `us` and poll.
    pub fn advance(&mut self, us: Micros) {
        self.now = self.now.wrapping_add(us);
        self.poll();
    }

    /// Poll once per internal step, `count` times, starting now.
    pub fn run_steps(&mut self, count: usize) {
        for i in 0..count {
            if i == 0 {
                self.poll();
            } else {
                self.advance(STEP_US);
            }
        }
    }
}

/// Engine with `voices` voices in `mode` and a fast, unsmoothed internal clock.
pub fn test_engine(voices: usize, mode: KeyMode) -> PerformanceEngine {
    test_builder(voices, mode)
        .build()
        .expect("Failed to create test engine")
}

pub fn test_builder(voices: usize, mode: KeyMode) -> EngineBuilder {
    PerformanceEngine::builder()
        .voices(voices)
        .key_mode(mode)
        .arp_rate(TEST_RATE_HZ)
        .rate_smoothing(0)
}

pub fn rig(voices: usize, mode: KeyMode) -> Rig {
    Rig::new(test_engine(voices, mode))
}

pub fn arp_rig(mode: ArpMode, range: u8) -> Rig {
    Rig::new(
        test_builder(8, KeyMode::Whole)
            .arp_mode(mode)
            .arp_range(range)
            .build()
            .expect("Failed to create test engine"),
    )
}

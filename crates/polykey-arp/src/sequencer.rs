//! Arpeggiator sequencer.
//!
//! Turns clock steps into synthesized note-on/off pairs over the held notes
//! of one zone. Notes go straight to the voice allocator and are tagged as
//! synthetic, so neither the hold latch nor the note registry sees them.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use polykey_synth::{NoteRegistry, VoiceAllocator, Zone};

use crate::error::{Error, Result};
use crate::mode::ArpMode;
use crate::pattern::{ArpPattern, MAX_RANGE, MIN_RANGE};

const DEFAULT_SEED: u64 = 0x2545_F491_4F6C_DD1D;
const DEFAULT_VELOCITY: u8 = 100;

/// Velocity given to arpeggiator notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArpVelocity {
    /// Velocity of the most recent key press in the arpeggiator zone
    #[default]
    LastPlayed,
    Fixed(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArpConfig {
    pub mode: ArpMode,
    /// Octaves covered by the pattern (1-4)
    pub range: u8,
    pub velocity: ArpVelocity,
    /// Seed for [`ArpMode::Random`]
    pub seed: u64,
}

impl Default for ArpConfig {
    fn default() -> Self {
        Self {
            mode: ArpMode::Off,
            range: 1,
            velocity: ArpVelocity::LastPlayed,
            seed: DEFAULT_SEED,
        }
    }
}

impl ArpConfig {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_RANGE..=MAX_RANGE).contains(&self.range) {
            return Err(Error::InvalidRange(self.range));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArpState {
    #[default]
    Off,
    Running,
}

/// Change of [`ArpState`] reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpTransition {
    Started,
    Stopped,
}

/// A note sounded by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpStep {
    pub zone: Zone,
    pub pitch: u8,
    /// Index into the unfolded pattern
    pub position: usize,
    /// Voice that took the note, `None` if the pool dropped it
    pub voice: Option<usize>,
}

/// xorshift64, enough for picking pattern indices.
#[derive(Debug, Clone)]
struct XorShift(u64);

impl XorShift {
    fn new(seed: u64) -> Self {
        Self(if seed == 0 { DEFAULT_SEED } else { seed })
    }

    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next() % bound as u64) as usize
    }
}

pub struct Arpeggiator {
    mode: ArpMode,
    range: u8,
    velocity: ArpVelocity,
    last_velocity: u8,

    state: ArpState,
    pattern: ArpPattern,
    /// Held set, range or mode changed since the last rebuild
    dirty: bool,
    position: Option<usize>,
    ascending: bool,
    current: Option<(Zone, u8)>,
    rng: XorShift,
}

impl Arpeggiator {
    pub fn new(config: ArpConfig) -> Self {
        Self {
            mode: config.mode,
            range: config.range.clamp(MIN_RANGE, MAX_RANGE),
            velocity: config.velocity,
            last_velocity: DEFAULT_VELOCITY,
            state: ArpState::Off,
            pattern: ArpPattern::new(),
            dirty: true,
            position: None,
            ascending: true,
            current: None,
            rng: XorShift::new(config.seed),
        }
    }

    pub fn mode(&self) -> ArpMode {
        self.mode
    }

    pub fn range(&self) -> u8 {
        self.range
    }

    pub fn state(&self) -> ArpState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == ArpState::Running
    }

    /// Zone and pitch of the sounding step, if any.
    pub fn current_note(&self) -> Option<(Zone, u8)> {
        self.current
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn pattern(&self) -> &ArpPattern {
        &self.pattern
    }

    /// Change the play mode. Switching to Off stops the sequencer and
    /// releases the sounding note; other changes take effect at the next step.
    pub fn set_mode(&mut self, mode: ArpMode, alloc: &mut VoiceAllocator) -> Option<ArpTransition> {
        if mode == self.mode {
            return None;
        }
        debug!(from = self.mode.name(), to = mode.name(), "arp mode");
        self.mode = mode;
        self.dirty = true;

        if !mode.is_on() && self.stop(alloc) {
            return Some(ArpTransition::Stopped);
        }
        None
    }

    /// Octave range, clamped to 1-4. Applied at the next step.
    pub fn set_range(&mut self, range: u8) {
        let range = range.clamp(MIN_RANGE, MAX_RANGE);
        if range != self.range {
            self.range = range;
            self.dirty = true;
        }
    }

    pub fn set_velocity(&mut self, velocity: ArpVelocity) {
        self.velocity = velocity;
    }

    /// Record the velocity of a real key press in the arpeggiator zone.
    pub fn note_velocity(&mut self, velocity: u8) {
        self.last_velocity = velocity;
    }

    pub fn velocity(&self) -> u8 {
        match self.velocity {
            ArpVelocity::LastPlayed => self.last_velocity,
            ArpVelocity::Fixed(velocity) => velocity,
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = XorShift::new(seed);
    }

    /// The held set changed. The pattern is rebuilt at the next step so the
    /// sounding note finishes its step.
    pub fn notes_changed(&mut self) {
        self.dirty = true;
    }

    /// Start or stop according to the mode and the number of held keys.
    pub fn sync(&mut self, held: usize, alloc: &mut VoiceAllocator) -> Option<ArpTransition> {
        match self.state {
            ArpState::Off if self.mode.is_on() && held > 0 => {
                self.state = ArpState::Running;
                self.position = None;
                self.ascending = true;
                self.dirty = true;
                debug!(mode = self.mode.name(), range = self.range, "arp started");
                Some(ArpTransition::Started)
            }
            ArpState::Running if !self.mode.is_on() || held == 0 => {
                self.stop(alloc);
                Some(ArpTransition::Stopped)
            }
            _ => None,
        }
    }

    /// Advance one step over the held notes of `zone`.
    ///
    /// Releases the previous note first, then sounds the next one. Returns
    /// `None` when not running or when the held set turned out empty, in
    /// which case the sequencer stops.
    pub fn step(
        &mut self,
        registry: &NoteRegistry,
        zone: Zone,
        alloc: &mut VoiceAllocator,
    ) -> Option<ArpStep> {
        if !self.is_running() {
            return None;
        }

        if self.dirty {
            self.rebuild(registry, zone);
        }
        if self.pattern.is_empty() {
            self.stop(alloc);
            return None;
        }

        self.force_release(alloc);

        let position = self.advance();
        let pitch = self.pattern.get(position)?;
        let allocation = alloc.assign_synthetic(zone, pitch, self.velocity());
        self.current = Some((zone, pitch));

        trace!(pitch, position, voice = ?allocation.voice(), "arp step");
        Some(ArpStep {
            zone,
            pitch,
            position,
            voice: allocation.voice(),
        })
    }

    /// Release the sounding step, if any. The sequencer keeps running.
    pub fn force_release(&mut self, alloc: &mut VoiceAllocator) -> bool {
        match self.current.take() {
            Some((zone, pitch)) => {
                alloc.force_release(zone, pitch);
                true
            }
            None => false,
        }
    }

    /// Release the sounding step and go Off. Returns whether it was running.
    pub fn stop(&mut self, alloc: &mut VoiceAllocator) -> bool {
        self.force_release(alloc);
        self.position = None;
        self.ascending = true;
        self.dirty = true;

        let was_running = self.is_running();
        self.state = ArpState::Off;
        if was_running {
            debug!("arp stopped");
        }
        was_running
    }

    fn rebuild(&mut self, registry: &NoteRegistry, zone: Zone) {
        self.pattern.rebuild(registry.held_pitches(zone), self.range);
        self.dirty = false;

        if self.pattern.is_empty() {
            return;
        }
        // Keep walking from the sounding note when it survived the change.
        let last = self.pattern.len() - 1;
        self.position = match self.current {
            Some((_, pitch)) => self
                .pattern
                .position_of(pitch)
                .or(self.position.map(|p| p.min(last))),
            None => self.position.map(|p| p.min(last)),
        };
    }

    fn advance(&mut self) -> usize {
        let len = self.pattern.len();
        let next = match (self.mode, self.position) {
            (ArpMode::Random, _) => self.rng.below(len),
            (ArpMode::Down, None) => len - 1,
            (ArpMode::Down, Some(p)) => {
                if p == 0 || p >= len {
                    len - 1
                } else {
                    p - 1
                }
            }
            (ArpMode::UpDown, _) if len == 1 => 0,
            (ArpMode::UpDown, None) => {
                self.ascending = true;
                0
            }
            (ArpMode::UpDown, Some(p)) => {
                let p = p.min(len - 1);
                if self.ascending {
                    if p + 1 >= len {
                        self.ascending = false;
                        p - 1
                    } else {
                        p + 1
                    }
                } else if p == 0 {
                    self.ascending = true;
                    1
                } else {
                    p - 1
                }
            }
            (_, None) => 0,
            (_, Some(p)) => (p + 1) % len,
        };
        self.position = Some(next);
        next
    }
}

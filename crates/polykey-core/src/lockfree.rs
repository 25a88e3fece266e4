//! Lock-free primitives shared between interrupt context and the poll loop.
//!
//! Every value here is a single fixed-width atomic. Writers (interrupt
//! handlers, MIDI callbacks) never update more than one field as a unit, and
//! readers snapshot each field once per poll iteration.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use atomic_float::AtomicF32;

/// Cache-line aligned atomic f32.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFloat {
    value: AtomicF32,
}

impl AtomicFloat {
    pub fn new(value: f32) -> Self {
        Self {
            value: AtomicF32::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.value.store(value, Ordering::Release);
    }
}

impl Default for AtomicFloat {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Cache-line aligned atomic bool.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }

    /// Read and clear in one operation. Used for request flags raised from
    /// interrupt context (e.g. the pulse indicator).
    #[inline]
    pub fn take(&self) -> bool {
        self.value.swap(false, Ordering::AcqRel)
    }
}

impl Default for AtomicFlag {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Monotonic wrapping event counter written from interrupt context.
///
/// The counter is never reset by the reader. Consumers keep a
/// [`CounterCursor`] and drain the difference since their last observation,
/// so a slow poll loop never loses events.
#[derive(Debug, Default)]
#[repr(align(64))]
pub struct TickCounter {
    count: AtomicU32,
}

impl TickCounter {
    pub fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Record one event. Returns the new count.
    #[inline]
    pub fn increment(&self) -> u32 {
        self.count.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    #[inline]
    pub fn get(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    /// Reset to zero. Only writers that own the counter's epoch may do this
    /// (see the MIDI clock input).
    #[inline]
    pub fn reset(&self) {
        self.count.store(0, Ordering::Release);
    }
}

/// Reader-side position in a [`TickCounter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterCursor {
    last_seen: u32,
}

impl CounterCursor {
    pub fn new(start: u32) -> Self {
        Self { last_seen: start }
    }

    /// Number of events since the previous drain, given a snapshot of the
    /// counter. Wraps correctly across `u32::MAX`.
    #[inline]
    pub fn drain(&mut self, snapshot: u32) -> u32 {
        let delta = snapshot.wrapping_sub(self.last_seen);
        self.last_seen = snapshot;
        delta
    }

    /// Skip everything up to `snapshot` without reporting it.
    #[inline]
    pub fn sync_to(&mut self, snapshot: u32) {
        self.last_seen = snapshot;
    }

    #[inline]
    pub fn last_seen(&self) -> u32 {
        self.last_seen
    }
}

//! Voice-stealing policies.
//!
//! Every zone selects its policy explicitly. All built-in policies, and any
//! custom one, reduce to a single comparator: the voice that orders first is
//! stolen first.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::voice::Voice;

/// Ranks two steal candidates. `Ordering::Less` means `a` is stolen before `b`.
pub type VoiceComparator = fn(&Voice, &Voice) -> Ordering;

/// Strategy for choosing a voice to steal when a zone's pool is exhausted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum StealPolicy {
    /// Steal the voice that started first
    #[default]
    Oldest,
    /// Steal the most recently started voice ("last note" replaces last note)
    Newest,
    /// Steal the lowest pitched voice
    LowestNote,
    /// Steal the highest pitched voice
    HighestNote,
    /// Never steal - drop new notes if no voices are free
    NoSteal,
    /// Caller-supplied ordering
    #[serde(skip)]
    Custom(VoiceComparator),
}

impl StealPolicy {
    /// Comparator for this policy, or `None` for [`StealPolicy::NoSteal`].
    pub fn comparator(&self) -> Option<VoiceComparator> {
        match self {
            StealPolicy::Oldest => Some(oldest_first),
            StealPolicy::Newest => Some(newest_first),
            StealPolicy::LowestNote => Some(lowest_first),
            StealPolicy::HighestNote => Some(highest_first),
            StealPolicy::NoSteal => None,
            StealPolicy::Custom(compare) => Some(*compare),
        }
    }

    /// Pick the steal victim among `candidates`.
    ///
    /// Voices whose key is already up (kept alive only by the hold latch)
    /// are taken before voices whose key is still down; the comparator
    /// breaks ties within each group.
    pub fn select<'a>(
        &self,
        candidates: impl Iterator<Item = (usize, &'a Voice)>,
    ) -> Option<usize> {
        let compare = self.comparator()?;
        candidates
            .min_by(|(_, a), (_, b)| a.key_down.cmp(&b.key_down).then_with(|| compare(a, b)))
            .map(|(index, _)| index)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StealPolicy::Oldest => "Oldest",
            StealPolicy::Newest => "Newest",
            StealPolicy::LowestNote => "Lowest",
            StealPolicy::HighestNote => "Highest",
            StealPolicy::NoSteal => "No steal",
            StealPolicy::Custom(_) => "Custom",
        }
    }
}

fn oldest_first(a: &Voice, b: &Voice) -> Ordering {
    a.time_on.cmp(&b.time_on)
}

fn newest_first(a: &Voice, b: &Voice) -> Ordering {
    b.time_on.cmp(&a.time_on)
}

fn lowest_first(a: &Voice, b: &Voice) -> Ordering {
    a.note.cmp(&b.note).then_with(|| oldest_first(a, b))
}

fn highest_first(a: &Voice, b: &Voice) -> Ordering {
    b.note.cmp(&a.note).then_with(|| oldest_first(a, b))
}

//! Task ID issuance.
//!
//! # Invariants
//! - Issued IDs strictly increase, even when the wall clock stalls or moves
//!   backwards.
//! - A generator seeded with the largest hydrated ID never reissues it.
//! - The generator is exhausted after `TaskId::MAX`; it never wraps or repeats.

use crate::model::task::TaskId;
use std::time::{SystemTime, UNIX_EPOCH};

/// Issues creation-time task IDs in epoch milliseconds.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    last: TaskId,
    clock: fn() -> TaskId,
}

impl IdGenerator {
    /// Creates a wall-clock generator whose IDs are all greater than `last`.
    pub fn seeded(last: TaskId) -> Self {
        Self::with_clock(last, epoch_millis)
    }

    /// Creates a generator reading time from `clock`.
    pub fn with_clock(last: TaskId, clock: fn() -> TaskId) -> Self {
        Self { last, clock }
    }

    /// Returns the next ID, or `None` once `TaskId::MAX` has been issued or
    /// seeded.
    pub fn next_id(&mut self) -> Option<TaskId> {
        let now = (self.clock)();
        let id = if now > self.last {
            now
        } else {
            self.last.checked_add(1)?
        };
        self.last = id;
        Some(id)
    }
}

fn epoch_millis() -> TaskId {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|elapsed| TaskId::try_from(elapsed.as_millis()).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::IdGenerator;

    #[test]
    fn stalled_clock_still_yields_increasing_ids() {
        let mut ids = IdGenerator::with_clock(0, || 1_000);
        assert_eq!(ids.next_id(), Some(1_000));
        assert_eq!(ids.next_id(), Some(1_001));
        assert_eq!(ids.next_id(), Some(1_002));
    }

    #[test]
    fn seed_above_clock_wins() {
        let mut ids = IdGenerator::with_clock(5_000, || 1_000);
        assert_eq!(ids.next_id(), Some(5_001));
    }

    #[test]
    fn generator_is_exhausted_at_max_id() {
        let mut ids = IdGenerator::with_clock(i64::MAX - 1, || 1_000);
        assert_eq!(ids.next_id(), Some(i64::MAX));
        assert_eq!(ids.next_id(), None);
        assert_eq!(ids.next_id(), None);

        let mut seeded_at_max = IdGenerator::with_clock(i64::MAX, || 1_000);
        assert_eq!(seeded_at_max.next_id(), None);
    }

    #[test]
    fn wall_clock_ids_look_like_epoch_millis() {
        let mut ids = IdGenerator::seeded(0);
        let first = ids.next_id().unwrap();
        assert!(first > 1_600_000_000_000);
        assert!(ids.next_id().unwrap() > first);
    }
}

//! Per-reason aggregate of queued archivables.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::types::Archivable;

/// Everything accumulated under one failure reason.
///
/// `recoverable` only ever narrows from `true` to `false`, `size` never
/// decreases, and `when` never moves backwards even if the wall clock does.
pub struct ReasonRecord<A> {
    recoverable: bool,
    queue: Vec<Arc<A>>,
    size: u64,
    when: Option<DateTime<Utc>>,
}

impl<A> Default for ReasonRecord<A> {
    fn default() -> Self {
        Self {
            recoverable: true,
            queue: Vec::new(),
            size: 0,
            when: None,
        }
    }
}

impl<A: Archivable> ReasonRecord<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one push to this record. Does not deduplicate.
    pub(crate) fn push(&mut self, recoverable: bool, archivable: Arc<A>) {
        self.push_at(recoverable, archivable, Utc::now());
    }

    pub(crate) fn push_at(&mut self, recoverable: bool, archivable: Arc<A>, now: DateTime<Utc>) {
        self.touch(now);
        self.recoverable &= recoverable;
        self.size = self.size.saturating_add(archivable.size().unwrap_or(0));
        self.queue.push(archivable);
    }

    /// Fold another record for the same reason into this one.
    pub(crate) fn absorb(&mut self, other: ReasonRecord<A>) {
        self.recoverable &= other.recoverable;
        self.size = self.size.saturating_add(other.size);
        self.when = self.when.max(other.when);
        self.queue.extend(other.queue);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.when = Some(self.when.map_or(now, |prev| prev.max(now)));
    }

    pub fn recoverable(&self) -> bool {
        self.recoverable
    }

    /// Archivables in push order, duplicates included.
    pub fn queue(&self) -> &[Arc<A>] {
        &self.queue
    }

    /// Cumulative size of every push, in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Time of the most recent push, if any.
    pub fn when(&self) -> Option<DateTime<Utc>> {
        self.when
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of distinct archivables in the queue.
    pub fn distinct(&self) -> usize {
        self.queue
            .iter()
            .map(|archivable| archivable.id())
            .collect::<HashSet<_>>()
            .len()
    }
}

impl<A> fmt::Debug for ReasonRecord<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReasonRecord")
            .field("recoverable", &self.recoverable)
            .field("queued", &self.queue.len())
            .field("size", &self.size)
            .field("when", &self.when)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::test_support::Item;
    use chrono::TimeDelta;

    #[test]
    fn test_default_record() {
        let record = ReasonRecord::<Item>::new();
        assert!(record.recoverable());
        assert!(record.is_empty());
        assert_eq!(record.size(), 0);
        assert_eq!(record.when(), None);
    }

    #[test]
    fn test_recoverable_narrows_and_stays() {
        let mut record = ReasonRecord::new();
        record.push(true, Item::sized(1));
        record.push(false, Item::sized(1));
        record.push(true, Item::sized(1));
        assert!(!record.recoverable());

        let mut record = ReasonRecord::new();
        for _ in 0..3 {
            record.push(true, Item::sized(1));
        }
        assert!(record.recoverable());
    }

    #[test]
    fn test_size_accumulates_missing_as_zero() {
        let mut record = ReasonRecord::new();
        record.push(true, Item::sized(10));
        record.push(true, Item::sized(25));
        record.push(true, Item::unknown_size());
        assert_eq!(record.size(), 35);
    }

    #[test]
    fn test_size_saturates() {
        let mut record = ReasonRecord::new();
        record.push(true, Item::sized(u64::MAX));
        record.push(true, Item::sized(1));
        assert_eq!(record.size(), u64::MAX);
    }

    #[test]
    fn test_queue_keeps_duplicates() {
        let item = Item::sized(4);
        let mut record = ReasonRecord::new();
        record.push(true, item.clone());
        record.push(true, item.clone());
        assert_eq!(record.len(), 2);
        assert_eq!(record.distinct(), 1);
        assert_eq!(record.size(), 8);
    }

    #[test]
    fn test_when_never_moves_backwards() {
        let now = Utc::now();
        let mut record = ReasonRecord::new();
        record.push_at(true, Item::unknown_size(), now);
        record.push_at(true, Item::unknown_size(), now - TimeDelta::seconds(5));
        assert_eq!(record.when(), Some(now));

        record.push(true, Item::unknown_size());
        assert!(record.when().unwrap() >= now);
    }

    #[test]
    fn test_absorb() {
        let shared = Item::sized(3);
        let mut left = ReasonRecord::new();
        left.push(true, shared.clone());
        let mut right = ReasonRecord::new();
        right.push(false, shared.clone());
        right.push(true, Item::sized(7));
        let right_when = right.when();

        left.absorb(right);
        assert!(!left.recoverable());
        assert_eq!(left.len(), 3);
        assert_eq!(left.size(), 13);
        assert!(left.when() >= right_when);
    }
}

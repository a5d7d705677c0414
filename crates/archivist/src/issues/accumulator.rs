//! The issue accumulator: identity dedup set plus reason-keyed records.

use std::hash::Hash;
use std::sync::Arc;

use indexmap::map::Entry;
use indexmap::{Equivalent, IndexMap};

use super::record::ReasonRecord;
use super::types::{Archivable, ArchivableId};

/// Every distinct archivable pushed into an accumulator, in first-seen order.
pub struct SeenSet<A> {
    items: IndexMap<ArchivableId, Arc<A>>,
}

impl<A> Default for SeenSet<A> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }
}

impl<A: Archivable> SeenSet<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an archivable by identity. Returns `false` if it was already present.
    pub fn insert(&mut self, archivable: &Arc<A>) -> bool {
        match self.items.entry(archivable.id()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(archivable));
                true
            }
        }
    }

    pub fn contains(&self, id: ArchivableId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn get(&self, id: ArchivableId) -> Option<&Arc<A>> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<A>> {
        self.items.values()
    }
}

/// Reason records keyed by reason, in order of first push.
pub struct ReasonMap<R, A> {
    records: IndexMap<R, ReasonRecord<A>>,
}

impl<R, A> Default for ReasonMap<R, A> {
    fn default() -> Self {
        Self {
            records: IndexMap::new(),
        }
    }
}

impl<R: Eq + Hash, A: Archivable> ReasonMap<R, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record for `reason`, inserting a default one if absent.
    ///
    /// An existing record is returned untouched.
    pub fn record_for(&mut self, reason: R) -> &mut ReasonRecord<A> {
        self.records.entry(reason).or_default()
    }

    /// Resolve the record for `reason` and apply one push to it.
    ///
    /// Bypasses the accumulator-wide dedup set, so only the accumulator calls it.
    pub(crate) fn push(
        &mut self,
        reason: R,
        recoverable: bool,
        archivable: Arc<A>,
    ) -> &mut ReasonRecord<A> {
        let record = self.record_for(reason);
        record.push(recoverable, archivable);
        record
    }

    pub fn get<Q>(&self, reason: &Q) -> Option<&ReasonRecord<A>>
    where
        Q: ?Sized + Hash + Equivalent<R>,
    {
        self.records.get(reason)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&R, &ReasonRecord<A>)> {
        self.records.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &R> {
        self.records.keys()
    }
}

/// Push a run of archivables that share one reason and one recoverability verdict.
///
/// Same result as pushing each item on its own, but `seen` and `record` are
/// resolved once by the caller (see [`IssueAccumulator::batch`]). Iteration
/// follows the input order.
pub fn push_many<A, I>(
    seen: &mut SeenSet<A>,
    record: &mut ReasonRecord<A>,
    recoverable: bool,
    archivables: I,
) where
    A: Archivable,
    I: IntoIterator<Item = Arc<A>>,
{
    for archivable in archivables {
        seen.insert(&archivable);
        record.push(recoverable, archivable);
    }
}

/// Deduplicating, reason-grouped collection of undelivered archivables.
///
/// Created empty by its owner, mutated only by pushes, then handed off. It
/// holds no locks; concurrent producers keep one accumulator each and
/// [`merge`](Self::merge) them afterwards.
pub struct IssueAccumulator<R, A> {
    seen: SeenSet<A>,
    reasons: ReasonMap<R, A>,
}

impl<R, A> Default for IssueAccumulator<R, A> {
    fn default() -> Self {
        Self {
            seen: SeenSet::default(),
            reasons: ReasonMap::default(),
        }
    }
}

impl<R: Eq + Hash, A: Archivable> IssueAccumulator<R, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `archivable` as failed under `reason`.
    ///
    /// The archivable joins the dedup set once, but is appended to the
    /// reason's queue on every push.
    pub fn push(&mut self, reason: R, recoverable: bool, archivable: Arc<A>) -> &ReasonRecord<A> {
        self.seen.insert(&archivable);
        self.reasons.push(reason, recoverable, archivable)
    }

    /// Record a run of archivables under one reason, in order.
    pub fn push_all<I>(&mut self, reason: R, recoverable: bool, archivables: I) -> &ReasonRecord<A>
    where
        I: IntoIterator<Item = Arc<A>>,
    {
        let (seen, record) = self.batch(reason);
        push_many(seen, record, recoverable, archivables);
        record
    }

    /// Resolve the dedup set and the (possibly new) record for `reason`, for
    /// use with [`push_many`].
    pub fn batch(&mut self, reason: R) -> (&mut SeenSet<A>, &mut ReasonRecord<A>) {
        (&mut self.seen, self.reasons.record_for(reason))
    }

    /// Get-or-create the record for `reason` without pushing anything.
    pub fn record_for(&mut self, reason: R) -> &mut ReasonRecord<A> {
        self.reasons.record_for(reason)
    }

    pub fn record<Q>(&self, reason: &Q) -> Option<&ReasonRecord<A>>
    where
        Q: ?Sized + Hash + Equivalent<R>,
    {
        self.reasons.get(reason)
    }

    pub fn seen(&self) -> &SeenSet<A> {
        &self.seen
    }

    pub fn reasons(&self) -> &ReasonMap<R, A> {
        &self.reasons
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty() && self.reasons.is_empty()
    }

    /// True if any reason has been marked non-recoverable.
    pub fn has_unrecoverable(&self) -> bool {
        self.reasons.iter().any(|(_, record)| !record.recoverable())
    }

    /// Fold `other` into this accumulator.
    ///
    /// Dedup membership is unioned; per reason, queues are appended, sizes
    /// added, recoverability ANDed, and the later timestamp kept.
    pub fn merge(&mut self, other: Self) {
        for archivable in other.seen.items.into_values() {
            self.seen.insert(&archivable);
        }
        for (reason, record) in other.reasons.records {
            self.reasons.record_for(reason).absorb(record);
        }
    }
}

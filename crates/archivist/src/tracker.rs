//! Instrumented facade over an issue accumulator.
//!
//! Adds logging and metrics around pushes, labeled with a target name.

use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use tracing::{debug, warn};

use archivist_core::emit;
use archivist_core::metrics::events::{ArchivablesPending, IssueRecorded, ReasonDegraded};

use crate::issues::{Archivable, IssueAccumulator, IssueReport, ReasonRecord};

/// Records archiving failures into an [`IssueAccumulator`] and reports on them.
pub struct IssueTracker<R, A> {
    accumulator: IssueAccumulator<R, A>,
    /// Target label for logs and metrics.
    target: String,
}

impl<R, A> IssueTracker<R, A>
where
    R: Eq + Hash + Clone + Display,
    A: Archivable,
{
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            accumulator: IssueAccumulator::new(),
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Record one failed archivable.
    pub fn record(&mut self, reason: R, recoverable: bool, archivable: Arc<A>) {
        let bytes = archivable.size().unwrap_or(0);
        let previous = self.recoverable(&reason);

        self.accumulator.push(reason.clone(), recoverable, archivable);
        self.observe(&reason, previous, 1, bytes);
    }

    /// Record a run of failed archivables sharing one reason and verdict.
    pub fn record_batch<I>(&mut self, reason: R, recoverable: bool, archivables: I)
    where
        I: IntoIterator<Item = Arc<A>>,
    {
        let previous = self.recoverable(&reason);
        let mut count = 0u64;
        let mut bytes = 0u64;
        let archivables = archivables.into_iter().inspect(|archivable| {
            count += 1;
            bytes = bytes.saturating_add(archivable.size().unwrap_or(0));
        });

        self.accumulator.push_all(reason.clone(), recoverable, archivables);
        self.observe(&reason, previous, count, bytes);
    }

    pub fn accumulator(&self) -> &IssueAccumulator<R, A> {
        &self.accumulator
    }

    pub fn into_accumulator(self) -> IssueAccumulator<R, A> {
        self.accumulator
    }

    pub fn report(&self) -> IssueReport {
        IssueReport::from_accumulator(&self.accumulator).with_target(&self.target)
    }

    fn recoverable(&self, reason: &R) -> Option<bool> {
        self.accumulator.record(reason).map(ReasonRecord::recoverable)
    }

    fn observe(&self, reason: &R, previous: Option<bool>, count: u64, bytes: u64) {
        let Some(record) = self.accumulator.record(reason) else {
            return;
        };

        if previous.is_none() {
            debug!(reason = %reason, target = %self.target, "Created reason record");
        }
        if previous.unwrap_or(true) && !record.recoverable() {
            warn!(
                reason = %reason,
                target = %self.target,
                queued = record.len(),
                "Reason is no longer recoverable"
            );
            emit!(ReasonDegraded {
                reason: reason.to_string(),
                target: self.target.clone(),
            });
        }

        emit!(IssueRecorded {
            reason: reason.to_string(),
            count,
            bytes,
            target: self.target.clone(),
        });
        emit!(ArchivablesPending {
            count: self.accumulator.seen().len(),
            target: self.target.clone(),
        });
    }
}

//! Internal events for archivist metrics emission.
//!
//! Every event carries a `target` label naming the batch or tracker that
//! produced it, so several accumulators can share one process.

use metrics::{counter, gauge};
use tracing::trace;

/// Trait for internal events that can be emitted as metrics.
pub trait InternalEvent {
    fn emit(self);
}

/// Archivables were recorded under a failure reason.
pub struct IssueRecorded {
    pub reason: String,
    pub count: u64,
    /// Combined size of the recorded archivables (unknown sizes count as 0).
    pub bytes: u64,
    pub target: String,
}

impl InternalEvent for IssueRecorded {
    fn emit(self) {
        trace!(reason = %self.reason, count = self.count, bytes = self.bytes, target = %self.target, "Issue recorded");
        counter!(
            "archivist_issues_recorded_total",
            "reason" => self.reason.clone(),
            "target" => self.target.clone()
        )
        .increment(self.count);
        counter!(
            "archivist_issue_bytes_total",
            "reason" => self.reason,
            "target" => self.target
        )
        .increment(self.bytes);
    }
}

/// A reason group stopped being recoverable.
pub struct ReasonDegraded {
    pub reason: String,
    pub target: String,
}

impl InternalEvent for ReasonDegraded {
    fn emit(self) {
        trace!(reason = %self.reason, target = %self.target, "Reason degraded");
        counter!(
            "archivist_reasons_degraded_total",
            "reason" => self.reason,
            "target" => self.target
        )
        .increment(1);
    }
}

/// Number of distinct archivables currently held by an accumulator.
pub struct ArchivablesPending {
    pub count: usize,
    pub target: String,
}

impl InternalEvent for ArchivablesPending {
    fn emit(self) {
        gauge!("archivist_archivables_pending", "target" => self.target).set(self.count as f64);
    }
}

//! Accumulation of archiving issues.
//!
//! An [`IssueAccumulator`] collects archivables that could not be delivered,
//! deduplicated by identity and grouped by failure reason. Each reason keeps a
//! [`ReasonRecord`] with its recoverability, queue, cumulative size, and
//! last-update time. Deciding when to retry or flush is left to the caller.

mod accumulator;
mod record;
mod report;
mod types;

pub use accumulator::{IssueAccumulator, ReasonMap, SeenSet, push_many};
pub use record::ReasonRecord;
pub use report::{IssueReport, IssueTotals, ReasonSummary, ReportFormat};
pub use types::{Archivable, ArchivableId, ReasonKey};

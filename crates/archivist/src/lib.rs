//! archivist: tracks archivables that could not be delivered to storage.
//!
//! - `issues` - the issue accumulator, reason records, and reports
//! - `tracker` - logging/metrics facade over an accumulator
//! - `replay` - rebuilds accumulators from NDJSON failure logs
//! - `config` - batch configuration
//! - `runner` - drives configured batches end to end

pub mod config;
pub mod error;
pub mod issues;
pub mod replay;
pub mod runner;
pub mod tracker;

pub use config::{BatchConfig, BatchKey, Config, ReportConfig};
pub use error::{ReplayError, ReportError, RunError};
pub use issues::{
    Archivable, ArchivableId, IssueAccumulator, IssueReport, ReasonKey, ReasonRecord, push_many,
};
pub use replay::{ItemRegistry, PendingItem, Replayer};
pub use runner::run_batches;
pub use tracker::IssueTracker;

//! Error types for the archivist crate.

use std::path::PathBuf;

use snafu::prelude::*;

pub use archivist_core::error::ConfigError;

/// Errors that can occur while replaying a failure log.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ReplayError {
    /// Failed to open or read the input file.
    #[snafu(display("Failed to read replay input {}: {source}", path.display()))]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A line was not a valid failure entry.
    #[snafu(display("Invalid entry at {}:{line}: {source}", path.display()))]
    ParseLine {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
}

/// Errors that can occur while rendering a report.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ReportError {
    /// Failed to serialize the report.
    #[snafu(display("Failed to serialize report: {source}"))]
    ReportSerialize { source: serde_json::Error },
}

/// Errors that can occur while running configured batches.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RunError {
    /// Replaying a batch input failed.
    #[snafu(display("Batch '{batch}' failed: {source}"))]
    Replay { batch: String, source: ReplayError },

    /// Rendering a batch report failed.
    #[snafu(display("Report for batch '{batch}' failed: {source}"))]
    Render { batch: String, source: ReportError },

    /// Writing the rendered report failed.
    #[snafu(display("Failed to write report: {source}"))]
    Output { source: std::io::Error },
}

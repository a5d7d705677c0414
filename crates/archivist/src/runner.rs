//! Runs every configured batch and writes its report.

use std::io::Write;

use snafu::prelude::*;
use tracing::info;

use crate::config::Config;
use crate::error::{OutputSnafu, RenderSnafu, ReplaySnafu, RunError};
use crate::issues::IssueReport;
use crate::replay::Replayer;
use crate::tracker::IssueTracker;

/// Replay each batch into its own tracker and write the rendered reports to `out`.
///
/// Batches run in config order. The reports are also returned.
pub fn run_batches<W: Write>(config: &Config, out: &mut W) -> Result<Vec<IssueReport>, RunError> {
    let mut reports = Vec::with_capacity(config.batches.len());

    for (key, batch) in config.batches() {
        let mut tracker = IssueTracker::new(key.id());
        let mut replayer = Replayer::new(batch.unrecoverable_reasons.iter().cloned());
        replayer
            .replay_file(&batch.input, &mut tracker)
            .context(ReplaySnafu { batch: key.id() })?;

        let report = tracker.report();
        info!(
            batch = %key,
            reasons = report.totals.reasons,
            distinct = report.totals.distinct,
            unrecoverable = report.totals.unrecoverable_reasons,
            size_bytes = report.totals.size_bytes,
            "Batch accumulated"
        );

        let rendered = report
            .render(config.report.format(), config.report.pretty())
            .context(RenderSnafu { batch: key.id() })?;
        out.write_all(rendered.as_bytes()).context(OutputSnafu)?;
        if !rendered.ends_with('\n') {
            out.write_all(b"\n").context(OutputSnafu)?;
        }
        reports.push(report);
    }

    out.flush().context(OutputSnafu)?;
    Ok(reports)
}

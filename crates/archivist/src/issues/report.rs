//! Serializable snapshot of an accumulator, for handing off to reporting.

use std::fmt::Display;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use super::accumulator::IssueAccumulator;
use super::types::Archivable;
use crate::error::{ReportError, ReportSerializeSnafu};

/// Output encoding for rendered reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// A single JSON document.
    #[default]
    Json,
    /// One JSON object per reason, followed by a totals line.
    Ndjson,
}

/// Statistics for one reason group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonSummary {
    pub reason: String,
    pub recoverable: bool,
    /// Queue length, repeats included.
    pub queued: usize,
    pub distinct: usize,
    pub size_bytes: u64,
    pub last_update: Option<DateTime<Utc>>,
}

/// Accumulator-wide statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTotals {
    pub distinct: usize,
    pub queued: usize,
    pub size_bytes: u64,
    pub reasons: usize,
    pub unrecoverable_reasons: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub reasons: Vec<ReasonSummary>,
    pub totals: IssueTotals,
}

#[derive(Serialize)]
struct TotalsLine<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<&'a str>,
    generated_at: DateTime<Utc>,
    totals: &'a IssueTotals,
}

impl IssueReport {
    /// Summarize every reason of `accumulator`, in first-push order.
    pub fn from_accumulator<R, A>(accumulator: &IssueAccumulator<R, A>) -> Self
    where
        R: Eq + Hash + Display,
        A: Archivable,
    {
        let reasons: Vec<ReasonSummary> = accumulator
            .reasons()
            .iter()
            .map(|(reason, record)| ReasonSummary {
                reason: reason.to_string(),
                recoverable: record.recoverable(),
                queued: record.len(),
                distinct: record.distinct(),
                size_bytes: record.size(),
                last_update: record.when(),
            })
            .collect();

        let totals = IssueTotals {
            distinct: accumulator.seen().len(),
            queued: reasons.iter().map(|r| r.queued).sum(),
            size_bytes: reasons
                .iter()
                .fold(0u64, |total, r| total.saturating_add(r.size_bytes)),
            reasons: reasons.len(),
            unrecoverable_reasons: reasons.iter().filter(|r| !r.recoverable).count(),
        };

        Self {
            target: None,
            generated_at: Utc::now(),
            reasons,
            totals,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn render(&self, format: ReportFormat, pretty: bool) -> Result<String, ReportError> {
        match format {
            ReportFormat::Json => self.to_json(pretty),
            ReportFormat::Ndjson => self.to_ndjson(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, ReportError> {
        if pretty {
            serde_json::to_string_pretty(self).context(ReportSerializeSnafu)
        } else {
            serde_json::to_string(self).context(ReportSerializeSnafu)
        }
    }

    pub fn to_ndjson(&self) -> Result<String, ReportError> {
        let mut out = String::new();
        for summary in &self.reasons {
            out.push_str(&serde_json::to_string(summary).context(ReportSerializeSnafu)?);
            out.push('\n');
        }
        let totals = TotalsLine {
            target: self.target.as_deref(),
            generated_at: self.generated_at,
            totals: &self.totals,
        };
        out.push_str(&serde_json::to_string(&totals).context(ReportSerializeSnafu)?);
        out.push('\n');
        Ok(out)
    }
}

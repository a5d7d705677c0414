//! Replay of recorded archiving failures.
//!
//! Input is NDJSON, one failure per line:
//!
//! ```text
//! {"key": "https://example.com/", "reason": "offline", "recoverable": true, "size": 5120}
//! ```
//!
//! `recoverable` defaults to `true` and `size` may be omitted. Lines with the
//! same `key` refer to the same archivable.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::error::{ParseLineSnafu, ReadInputSnafu, ReplayError};
use crate::issues::{Archivable, ArchivableId, ReasonKey};
use crate::tracker::IssueTracker;

/// One line of a failure log.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayEntry {
    pub key: String,
    pub reason: ReasonKey,
    #[serde(default = "default_recoverable")]
    pub recoverable: bool,
    #[serde(default)]
    pub size: Option<u64>,
}

fn default_recoverable() -> bool {
    true
}

/// An archivable reconstructed from a failure log.
#[derive(Debug)]
pub struct PendingItem {
    id: ArchivableId,
    key: String,
    size: Option<u64>,
}

impl PendingItem {
    pub fn new(key: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            id: ArchivableId::next(),
            key: key.into(),
            size,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Archivable for PendingItem {
    fn id(&self) -> ArchivableId {
        self.id
    }

    fn size(&self) -> Option<u64> {
        self.size
    }
}

/// Hands out one shared [`PendingItem`] per key.
#[derive(Debug, Default)]
pub struct ItemRegistry {
    items: HashMap<String, Arc<PendingItem>>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the item for `key`, creating it on first sight.
    ///
    /// The size given on first sight sticks.
    pub fn resolve(&mut self, key: &str, size: Option<u64>) -> Arc<PendingItem> {
        if let Some(item) = self.items.get(key) {
            if size.is_some() && size != item.size {
                debug!(key, first = ?item.size, ignored = ?size, "Size differs from first sighting");
            }
            return Arc::clone(item);
        }
        let item = Arc::new(PendingItem::new(key, size));
        self.items.insert(key.to_string(), Arc::clone(&item));
        item
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Counters for one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Non-blank lines consumed.
    pub entries: usize,
    /// Batched pushes issued.
    pub runs: usize,
}

/// Feeds failure logs into an [`IssueTracker`].
///
/// Consecutive entries sharing reason and recoverability are pushed as one batch.
pub struct Replayer {
    registry: ItemRegistry,
    unrecoverable: HashSet<ReasonKey>,
}

struct Run {
    reason: ReasonKey,
    recoverable: bool,
    items: Vec<Arc<PendingItem>>,
}

impl Replayer {
    pub fn new(unrecoverable: impl IntoIterator<Item = ReasonKey>) -> Self {
        Self {
            registry: ItemRegistry::new(),
            unrecoverable: unrecoverable.into_iter().collect(),
        }
    }

    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    pub fn replay_file(
        &mut self,
        path: &Path,
        tracker: &mut IssueTracker<ReasonKey, PendingItem>,
    ) -> Result<ReplayStats, ReplayError> {
        let file = File::open(path).context(ReadInputSnafu { path })?;
        let stats = self.replay_reader(BufReader::new(file), path, tracker)?;
        info!(
            path = %path.display(),
            target = tracker.target(),
            entries = stats.entries,
            runs = stats.runs,
            "Replayed failure log"
        );
        Ok(stats)
    }

    /// Replay from any buffered reader; `path` is only used in errors.
    pub fn replay_reader<B: BufRead>(
        &mut self,
        reader: B,
        path: &Path,
        tracker: &mut IssueTracker<ReasonKey, PendingItem>,
    ) -> Result<ReplayStats, ReplayError> {
        let mut stats = ReplayStats::default();
        let mut pending: Option<Run> = None;

        for (index, line) in reader.lines().enumerate() {
            let line = line.context(ReadInputSnafu { path })?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: ReplayEntry = serde_json::from_str(&line).context(ParseLineSnafu {
                path,
                line: index + 1,
            })?;
            stats.entries += 1;

            let recoverable = entry.recoverable && !self.unrecoverable.contains(&entry.reason);
            let item = self.registry.resolve(&entry.key, entry.size);

            if let Some(run) = pending
                .as_mut()
                .filter(|run| run.reason == entry.reason && run.recoverable == recoverable)
            {
                run.items.push(item);
                continue;
            }

            let next = Run {
                reason: entry.reason,
                recoverable,
                items: vec![item],
            };
            if let Some(run) = pending.replace(next) {
                flush(run, tracker, &mut stats);
            }
        }

        if let Some(run) = pending {
            flush(run, tracker, &mut stats);
        }
        Ok(stats)
    }
}

fn flush(run: Run, tracker: &mut IssueTracker<ReasonKey, PendingItem>, stats: &mut ReplayStats) {
    stats.runs += 1;
    tracker.record_batch(run.reason, run.recoverable, run.items);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn replay(input: &str, unrecoverable: &[&str]) -> (IssueTracker<ReasonKey, PendingItem>, ReplayStats) {
        let mut tracker = IssueTracker::new("test");
        let mut replayer = Replayer::new(unrecoverable.iter().map(|r| ReasonKey::from(*r)));
        let stats = replayer
            .replay_reader(Cursor::new(input), Path::new("test.ndjson"), &mut tracker)
            .unwrap();
        (tracker, stats)
    }

    #[test]
    fn test_groups_consecutive_runs() {
        let input = r#"
{"key": "a", "reason": "offline", "size": 10}
{"key": "b", "reason": "offline", "size": 20}
{"key": "c", "reason": "quota", "recoverable": false}
{"key": "a", "reason": "offline"}
"#;
        let (tracker, stats) = replay(input, &[]);
        assert_eq!(stats, ReplayStats { entries: 4, runs: 3 });

        let acc = tracker.accumulator();
        assert_eq!(acc.seen().len(), 3);
        let offline = acc.record("offline").unwrap();
        let keys: Vec<_> = offline.queue().iter().map(|item| item.key()).collect();
        assert_eq!(keys, vec!["a", "b", "a"]);
        assert_eq!(offline.size(), 40);
        assert!(offline.recoverable());
        assert!(!acc.record("quota").unwrap().recoverable());
    }

    #[test]
    fn test_max_sizes_do_not_overflow() {
        let input = concat!(
            "{\"key\": \"a\", \"reason\": \"r1\", \"size\": 18446744073709551615}\n",
            "{\"key\": \"b\", \"reason\": \"r1\", \"size\": 1}\n",
            "{\"key\": \"c\", \"reason\": \"r2\", \"size\": 1}\n",
        );
        let (tracker, stats) = replay(input, &[]);
        assert_eq!(stats, ReplayStats { entries: 3, runs: 2 });
        assert_eq!(tracker.accumulator().record("r1").unwrap().size(), u64::MAX);
        assert_eq!(tracker.report().totals.size_bytes, u64::MAX);
    }

    #[test]
    fn test_forced_unrecoverable_reason() {
        let input = r#"{"key": "a", "reason": "forbidden", "recoverable": true}"#;
        let (tracker, _) = replay(input, &["forbidden"]);
        assert!(!tracker.accumulator().record("forbidden").unwrap().recoverable());
    }

    #[test]
    fn test_parse_error_reports_line() {
        let mut tracker = IssueTracker::new("test");
        let mut replayer = Replayer::new([]);
        let input = "{\"key\": \"a\", \"reason\": \"offline\"}\n\nnot json\n";
        let err = replayer
            .replay_reader(Cursor::new(input), Path::new("bad.ndjson"), &mut tracker)
            .unwrap_err();
        assert!(matches!(err, ReplayError::ParseLine { line: 3, .. }));
        assert!(err.to_string().starts_with("Invalid entry at bad.ndjson:3"));
    }

    #[test]
    fn test_registry_first_size_wins() {
        let mut registry = ItemRegistry::new();
        let first = registry.resolve("page", Some(7));
        let again = registry.resolve("page", Some(9));
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(again.size(), Some(7));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let mut tracker = IssueTracker::new("test");
        let mut replayer = Replayer::new([]);
        let err = replayer
            .replay_file(Path::new("/nonexistent/failures.ndjson"), &mut tracker)
            .unwrap_err();
        assert!(matches!(err, ReplayError::ReadInput { .. }));
    }
}

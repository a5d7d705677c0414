//! Integration tests for archivist

use std::fs;
use std::path::Path;
use std::sync::Arc;

use archivist::issues::{ReportFormat, SeenSet};
use archivist::{
    Archivable, ArchivableId, Config, IssueAccumulator, IssueReport, PendingItem, ReasonKey,
    push_many, run_batches,
};
use archivist_core::config::ConfigPath;

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

mod accumulator_tests {
    use super::*;

    struct Snapshot {
        id: ArchivableId,
        bytes: Option<u64>,
    }

    impl Archivable for Snapshot {
        fn id(&self) -> ArchivableId {
            self.id
        }

        fn size(&self) -> Option<u64> {
            self.bytes
        }
    }

    fn snapshot(bytes: Option<u64>) -> Arc<Snapshot> {
        Arc::new(Snapshot {
            id: ArchivableId::next(),
            bytes,
        })
    }

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum Reason {
        Offline,
        QuotaExceeded,
    }

    #[test]
    fn test_enum_reasons_and_dedup() {
        let mut acc = IssueAccumulator::new();
        let page = snapshot(Some(10));
        let frame = snapshot(None);
        acc.push(Reason::Offline, true, page.clone());
        acc.push(Reason::QuotaExceeded, false, page.clone());
        acc.push(Reason::QuotaExceeded, true, frame.clone());

        assert_eq!(acc.seen().len(), 2);
        let quota = acc.record(&Reason::QuotaExceeded).unwrap();
        assert!(!quota.recoverable());
        assert_eq!(quota.size(), 10);
        assert!(acc.record(&Reason::Offline).unwrap().recoverable());
    }

    #[test]
    fn test_external_batch_push() {
        let mut acc: IssueAccumulator<Reason, Snapshot> = IssueAccumulator::new();
        let items = vec![snapshot(Some(1)), snapshot(Some(2)), snapshot(Some(3))];
        {
            let (seen, record) = acc.batch(Reason::Offline);
            push_many(seen, record, true, items.iter().cloned());
        }
        let record = acc.record(&Reason::Offline).unwrap();
        assert_eq!(record.size(), 6);
        assert_eq!(record.distinct(), 3);
    }

    #[test]
    fn test_standalone_seen_set() {
        let mut seen = SeenSet::new();
        let item = snapshot(None);
        assert!(seen.insert(&item));
        assert!(!seen.insert(&item));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_merge_per_batch_accumulators() {
        let shared = Arc::new(PendingItem::new("https://example.com/", Some(64)));
        let mut first = IssueAccumulator::new();
        first.push(ReasonKey::from("offline"), true, shared.clone());
        let mut second = IssueAccumulator::new();
        second.push(ReasonKey::from("offline"), true, shared.clone());
        second.push(ReasonKey::from("forbidden"), false, Arc::new(PendingItem::new("x", None)));

        first.merge(second);
        let report = IssueReport::from_accumulator(&first);
        assert_eq!(report.totals.distinct, 2);
        assert_eq!(report.totals.queued, 3);
        assert_eq!(report.totals.size_bytes, 128);
        assert_eq!(report.totals.unrecoverable_reasons, 1);
    }
}

mod runner_tests {
    use super::*;

    #[test]
    fn test_run_batches_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(
            dir.path(),
            "nightly.ndjson",
            concat!(
                "{\"key\": \"https://a.example/\", \"reason\": \"offline\", \"size\": 100}\n",
                "{\"key\": \"https://b.example/\", \"reason\": \"offline\", \"size\": 50}\n",
                "{\"key\": \"https://a.example/\", \"reason\": \"forbidden\"}\n",
            ),
        );
        let config_path = write(
            dir.path(),
            "archivist.yaml",
            &format!(
                "batches:\n  nightly:\n    input: {}\n    unrecoverable_reasons: [forbidden]\nreport:\n  format: json\n",
                input.display()
            ),
        );

        let config = Config::from_paths(&[ConfigPath::file(&config_path)]).unwrap();
        let mut out = Vec::new();
        let reports = run_batches(&config, &mut out).unwrap();

        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.target.as_deref(), Some("nightly"));
        assert_eq!(report.totals.distinct, 2);
        assert_eq!(report.totals.queued, 3);
        assert_eq!(report.totals.size_bytes, 250);
        assert_eq!(report.totals.unrecoverable_reasons, 1);

        let written: IssueReport = serde_json::from_slice(&out).unwrap();
        assert_eq!(&written, report);
    }

    #[test]
    fn test_ndjson_output_from_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let conf_dir = dir.path().join("conf.d");
        fs::create_dir(&conf_dir).unwrap();
        let input = write(dir.path(), "a.ndjson", "{\"key\": \"k\", \"reason\": \"offline\"}\n");
        write(
            &conf_dir,
            "10-batches.yaml",
            &format!("batches:\n  a:\n    input: {}\n", input.display()),
        );
        write(&conf_dir, "20-report.yml", "report:\n  format: ndjson\n");

        let config = Config::from_paths(&[ConfigPath::dir(&conf_dir)]).unwrap();
        assert_eq!(config.report.format(), ReportFormat::Ndjson);

        let mut out = Vec::new();
        run_batches(&config, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_missing_input_names_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write(
            dir.path(),
            "archivist.yaml",
            "batches:\n  ghost:\n    input: /nonexistent/ghost.ndjson\n",
        );
        let config = Config::from_path(&config_path).unwrap();
        let err = run_batches(&config, &mut Vec::<u8>::new()).unwrap_err();
        assert!(err.to_string().starts_with("Batch 'ghost' failed"));
    }

    #[test]
    fn test_config_without_batches_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write(dir.path(), "archivist.yaml", "report:\n  pretty: true\n");
        assert!(Config::from_path(&config_path).is_err());
    }
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ocscan_core::{BatchDriver, Exporter, ScanError, SessionScanner};
use ocscan_logging::{LogFormat, Logger};
use ocscan_source::{
    FsSink, SessionListing, SessionSource, SessionTime, Sink, SinkError, SourceError,
};
use tempfile::TempDir;

/// In-memory session source. Sessions without a document fail to fetch.
struct MockSource {
    listing: Option<Vec<SessionListing>>,
    documents: HashMap<String, String>,
    offline: Vec<String>,
    fetches: AtomicUsize,
}

impl MockSource {
    fn new() -> Self {
        Self {
            listing: Some(Vec::new()),
            documents: HashMap::new(),
            offline: Vec::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    fn unavailable() -> Self {
        Self {
            listing: None,
            ..Self::new()
        }
    }

    fn with_session(mut self, id: &str, document: Option<&str>) -> Self {
        self.listing.get_or_insert_with(Vec::new).push(SessionListing {
            id: Some(id.to_string()),
            title: Some(format!("Listing title {}", id)),
            directory: Some("/listing/dir".to_string()),
            time: Some(SessionTime {
                created: Some(1735689600000),
                updated: None,
            }),
        });
        if let Some(document) = document {
            self.documents.insert(id.to_string(), document.to_string());
        }
        self
    }

    fn with_listing_entry(mut self, entry: SessionListing) -> Self {
        self.listing.get_or_insert_with(Vec::new).push(entry);
        self
    }
}

#[async_trait]
impl SessionSource for MockSource {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn list_sessions(&self) -> Result<Vec<SessionListing>, SourceError> {
        self.listing
            .clone()
            .ok_or_else(|| SourceError::Unavailable("mock source offline".to_string()))
    }

    async fn fetch_session(&self, id: &str) -> Result<String, SourceError> {
        let fetch_count = self.fetches.fetch_add(1, Ordering::SeqCst);
        if fetch_count > 0 && self.offline.iter().any(|o| o == id) {
            return Err(SourceError::Unavailable("mock source went offline".to_string()));
        }
        self.documents
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::FetchFailed {
                id: id.to_string(),
                reason: "no such session".to_string(),
            })
    }

    async fn is_available(&self) -> bool {
        self.listing.is_some()
    }

    fn binary_path(&self) -> &Path {
        Path::new("mock")
    }
}

/// Sink that records writes and fails for chosen destinations
#[derive(Default)]
struct RecordingSink {
    fail_for: Vec<String>,
    writes: Mutex<Vec<(PathBuf, Vec<u8>)>>,
    mkdirs: AtomicUsize,
}

impl Sink for RecordingSink {
    fn ensure_directory(&self, _path: &Path) -> Result<bool, SinkError> {
        Ok(self.mkdirs.fetch_add(1, Ordering::SeqCst) == 0)
    }

    fn write(&self, destination: &Path, content: &[u8]) -> Result<(), SinkError> {
        let name = destination.file_name().unwrap().to_string_lossy().to_string();
        if self.fail_for.contains(&name) {
            return Err(SinkError::WriteFailed {
                destination: destination.to_path_buf(),
                reason: "disk full".to_string(),
            });
        }
        self.writes
            .lock()
            .unwrap()
            .push((destination.to_path_buf(), content.to_vec()));
        Ok(())
    }
}

const MATCHING: &str = r#"{"info":{"id":"ses_match","title":"Matching session","directory":"/work/app","time":{"created":1735689600000}},"messages":[{"info":{"id":"msg_1"},"parts":[{"type":"tool","tool":"write","state":{"input":{"filePath":"/work/app/a.md","content":"<content>oops</content>"}}}]}]}"#;

const CLEAN: &str = r#"{"info":{"id":"ses_clean"},"messages":[{"parts":[{"type":"tool","tool":"write","state":{"input":{"content":"all good"}}}]}]}"#;

fn logger() -> Arc<Logger> {
    Arc::new(Logger::quiet())
}

#[tokio::test]
async fn test_batch_survives_fetch_failure() {
    let source = MockSource::new()
        .with_session("ses_missing", None)
        .with_session("ses_match", Some(MATCHING))
        .with_session("ses_clean", Some(CLEAN));

    let driver = BatchDriver::new(&source, SessionScanner::default(), logger());
    let result = driver.run().await.unwrap();

    assert_eq!(result.reports.len(), 1);
    assert_eq!(result.reports[0].session_id, "ses_match");
    assert_eq!(result.listed, 3);
    assert_eq!(result.processed, 3);
    assert_eq!(result.fetch_failures, 1);
    assert_eq!(result.parse_failures, 0);
    assert!(!result.interrupted);
}

#[tokio::test]
async fn test_batch_counts_parse_failures() {
    let source = MockSource::new()
        .with_session("ses_garbage", Some("Exporting session: {not json"))
        .with_session("ses_match", Some(MATCHING));

    let driver = BatchDriver::new(&source, SessionScanner::default(), logger());
    let result = driver.run().await.unwrap();

    assert_eq!(result.match_count(), 1);
    assert_eq!(result.parse_failures, 1);
    assert_eq!(result.failures(), 1);
}

#[tokio::test]
async fn test_batch_unavailable_source_is_fatal() {
    let source = MockSource::unavailable();
    let driver = BatchDriver::new(&source, SessionScanner::default(), logger());

    let err = driver.run().await.unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, ScanError::SourceUnavailable(_)));
}

#[tokio::test]
async fn test_batch_preserves_listing_order() {
    let source = MockSource::new()
        .with_session("ses_b", Some(MATCHING))
        .with_session("ses_clean", Some(CLEAN))
        .with_session("ses_a", Some(MATCHING));

    let driver = BatchDriver::new(&source, SessionScanner::default(), logger());
    let result = driver.run().await.unwrap();

    let ids: Vec<&str> = result.reports.iter().map(|r| r.session_id.as_str()).collect();
    assert_eq!(ids, vec!["ses_b", "ses_a"]);
}

#[tokio::test]
async fn test_batch_skips_entries_without_id() {
    let source = MockSource::new()
        .with_listing_entry(SessionListing::default())
        .with_session("ses_match", Some(MATCHING));

    let driver = BatchDriver::new(&source, SessionScanner::default(), logger());
    let result = driver.run().await.unwrap();

    assert_eq!(result.skipped, 1);
    assert_eq!(result.processed, 1);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_batch_report_contents() {
    let source = MockSource::new().with_session("ses_match", Some(MATCHING));

    let driver = BatchDriver::new(&source, SessionScanner::default(), logger());
    let result = driver.run().await.unwrap();
    let report = &result.reports[0];

    assert_eq!(report.title, "Matching session");
    assert_eq!(report.directory, "/work/app");
    assert_eq!(report.created_at, "2025-01-01T00:00:00.000Z");
    assert_eq!(report.matches[0].file_path, "/work/app/a.md");
    assert_eq!(report.matches[0].message_id, "msg_1");
    assert_eq!(
        report.to_tsv_line(),
        "ses_match\t2025-01-01T00:00:00.000Z\tMatching session\t/work/app\t.messages[0].parts[0].state.input.content"
    );
}

#[tokio::test]
async fn test_batch_stops_when_interrupted() {
    let source = MockSource::new()
        .with_session("ses_match", Some(MATCHING))
        .with_session("ses_other", Some(MATCHING));

    let driver = BatchDriver::new(&source, SessionScanner::default(), logger());
    driver.interrupt_handle().store(true, Ordering::SeqCst);
    let result = driver.run().await.unwrap();

    assert!(result.interrupted);
    assert_eq!(result.processed, 0);
    assert!(result.reports.is_empty());
}

#[tokio::test]
async fn test_export_is_byte_identical_across_runs() {
    let dir = TempDir::new().unwrap();
    let output_dir = dir.path().join("found");
    let source = MockSource::new()
        .with_session("ses_match", Some(MATCHING))
        .with_session("ses_clean", Some(CLEAN));
    let sink = FsSink::new();

    let driver = BatchDriver::new(&source, SessionScanner::default(), logger());
    let result = driver.run().await.unwrap();
    let exporter = Exporter::new(&source, &sink, logger());

    let first = exporter.export(&result.reports, &output_dir).await.unwrap();
    let first_bytes = std::fs::read(output_dir.join("ses_match.json")).unwrap();
    let second = exporter.export(&result.reports, &output_dir).await.unwrap();
    let second_bytes = std::fs::read(output_dir.join("ses_match.json")).unwrap();

    assert_eq!(first.saved, vec![output_dir.join("ses_match.json")]);
    assert_eq!(second.saved, first.saved);
    assert_eq!(first_bytes, MATCHING.as_bytes());
    assert_eq!(first_bytes, second_bytes);
    assert!(!output_dir.join("ses_clean.json").exists());
}

#[tokio::test]
async fn test_export_continues_after_write_failure() {
    let source = MockSource::new()
        .with_session("ses_a", Some(MATCHING))
        .with_session("ses_b", Some(MATCHING))
        .with_session("ses_c", Some(MATCHING));
    let sink = RecordingSink {
        fail_for: vec!["ses_b.json".to_string()],
        ..Default::default()
    };

    let driver = BatchDriver::new(&source, SessionScanner::default(), logger());
    let result = driver.run().await.unwrap();
    let exporter = Exporter::new(&source, &sink, logger());
    let summary = exporter
        .export(&result.reports, Path::new("found"))
        .await
        .unwrap();

    assert_eq!(summary.saved.len(), 2);
    assert_eq!(summary.failed(), 1);
    assert!(matches!(summary.failures[0], ScanError::WriteFailed { .. }));
    assert_eq!(sink.mkdirs.load(Ordering::SeqCst), 1);

    let written: Vec<PathBuf> = sink.writes.lock().unwrap().iter().map(|(p, _)| p.clone()).collect();
    assert_eq!(
        written,
        vec![PathBuf::from("found/ses_a.json"), PathBuf::from("found/ses_c.json")]
    );
}

#[tokio::test]
async fn test_export_refetches_raw_document() {
    let source = MockSource::new().with_session("ses_match", Some(MATCHING));
    let sink = RecordingSink::default();

    let driver = BatchDriver::new(&source, SessionScanner::default(), logger());
    let result = driver.run().await.unwrap();
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

    Exporter::new(&source, &sink, logger())
        .export(&result.reports, Path::new("found"))
        .await
        .unwrap();

    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    assert_eq!(sink.writes.lock().unwrap()[0].1, MATCHING.as_bytes());
}

#[tokio::test]
async fn test_export_nothing_to_do() {
    let source = MockSource::new();
    let sink = RecordingSink::default();

    let summary = Exporter::new(&source, &sink, logger())
        .export(&[], Path::new("found"))
        .await
        .unwrap();

    assert!(summary.saved.is_empty());
    assert_eq!(sink.mkdirs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_export_source_outage_is_per_session_failure() {
    let mut source = MockSource::new()
        .with_session("ses_a", Some(MATCHING))
        .with_session("ses_b", Some(MATCHING));
    source.offline.push("ses_a".to_string());
    let sink = RecordingSink::default();

    let driver = BatchDriver::new(&source, SessionScanner::default(), logger());
    let result = driver.run().await.unwrap();
    assert_eq!(result.match_count(), 2);

    let summary = Exporter::new(&source, &sink, logger())
        .export(&result.reports, Path::new("found"))
        .await
        .unwrap();

    assert_eq!(summary.saved, vec![PathBuf::from("found/ses_b.json")]);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.failures[0].is_fatal());
    match &summary.failures[0] {
        ScanError::FetchFailed { id, .. } => assert_eq!(id, "ses_a"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_export_reports_directory_as_given_to_sink() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("events.jsonl");
    let logger = Arc::new(Logger::with_file(LogFormat::Json, false, &log_path).unwrap());
    let source = MockSource::new().with_session("ses_match", Some(MATCHING));
    let sink = RecordingSink::default();

    let driver = BatchDriver::new(&source, SessionScanner::default(), logger.clone());
    let result = driver.run().await.unwrap();
    Exporter::new(&source, &sink, logger)
        .export(&result.reports, Path::new("not/on/disk"))
        .await
        .unwrap();

    let content = std::fs::read_to_string(&log_path).unwrap();
    let created: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
        .filter(|event| event["event"] == "directory_created")
        .collect();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["path"], "not/on/disk");
}

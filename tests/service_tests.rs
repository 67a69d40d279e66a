use build_analyzer::{
    AnalysisError, AnalysisService, AnalyzerConfig, DirLogStore, LogMetadata, LogStore, OpenedLog,
    ResultCache,
};
use std::fs;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const SAMPLE_LOG: &str = "2023-11-15 10:00:01 ERROR Failed to compile
2023-11-15 10:00:02 ERROR Failed to compile
2023-11-15 10:00:03 WARNING Package not found
Finished: SUCCESS
Total time: 5 minutes
";

fn store_with(logs: &[(&str, &str)]) -> (TempDir, DirLogStore) {
    let dir = TempDir::new().unwrap();
    for (id, content) in logs {
        fs::write(dir.path().join(format!("{}.log", id)), content).unwrap();
    }
    let store = DirLogStore::new(dir.path());
    (dir, store)
}

#[test]
fn test_analyze_stored_build() {
    let (_dir, store) = store_with(&[("5113", SAMPLE_LOG)]);
    let service = AnalysisService::new(store, ResultCache::new());

    let summary = service.analyze("5113").unwrap();
    assert_eq!(summary.status, "SUCCESS");
    assert_eq!(summary.total_errors, 2);
    assert_eq!(summary.content_length, SAMPLE_LOG.len() as u64);
    assert!(service.cache().contains_key("5113"));
}

#[test]
fn test_second_request_served_from_cache() {
    let (dir, store) = store_with(&[("1", SAMPLE_LOG)]);
    let service = AnalysisService::new(store, ResultCache::new());

    let first = service.analyze("1").unwrap();
    // Changing the log on disk has no effect while the entry is fresh
    fs::write(dir.path().join("1.log"), "Finished: FAILURE\n").unwrap();
    let second = service.analyze("1").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.status, "SUCCESS");
}

#[test]
fn test_expired_result_is_recomputed() {
    let (dir, store) = store_with(&[("1", SAMPLE_LOG)]);
    let service = AnalysisService::new(store, ResultCache::with_ttl(Duration::from_millis(30)));

    service.analyze("1").unwrap();
    fs::write(dir.path().join("1.log"), "Finished: FAILURE\n").unwrap();
    std::thread::sleep(Duration::from_millis(80));

    let fresh = service.analyze("1").unwrap();
    assert_eq!(fresh.status, "FAILURE");
    assert_eq!(fresh.total_errors, 0);
}

#[test]
fn test_missing_build_is_not_cached() {
    let (_dir, store) = store_with(&[]);
    let service = AnalysisService::new(store, ResultCache::new());

    let err = service.analyze("404").unwrap_err();
    assert!(matches!(err, AnalysisError::LogNotFound { .. }));
    assert!(service.cache().is_empty());
}

#[test]
fn test_invalid_build_id() {
    let (_dir, store) = store_with(&[]);
    let service = AnalysisService::new(store, ResultCache::new());
    assert!(matches!(
        service.analyze("../secrets"),
        Err(AnalysisError::InvalidBuildId(_))
    ));
}

#[test]
fn test_metadata_and_listing() {
    let (_dir, store) = store_with(&[("b", "x"), ("a", SAMPLE_LOG)]);
    let service = AnalysisService::new(store, ResultCache::new());

    assert_eq!(service.available_builds().unwrap(), vec!["a", "b"]);
    let meta = service.metadata("a").unwrap();
    assert_eq!(meta.content_length, SAMPLE_LOG.len() as u64);
    assert!(meta.last_modified.is_some());
}

#[test]
fn test_analyze_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("console.txt");
    fs::write(&path, SAMPLE_LOG).unwrap();

    let service = AnalysisService::new(DirLogStore::new(dir.path()), ResultCache::new());
    let summary = service.analyze_path(&path).unwrap();
    assert_eq!(summary.duration, "5 minutes");
    assert!(service
        .file_cache()
        .contains_key(&path.display().to_string()));
    assert!(service.cache().is_empty());
}

#[test]
fn test_file_named_like_build_does_not_shadow_it() {
    let (_logs, store) = store_with(&[("5113", "Finished: SUCCESS\n")]);
    let work = TempDir::new().unwrap();
    fs::write(work.path().join("5113"), "Finished: FAILURE\n").unwrap();
    // Relative path whose text equals the build id; every other test here
    // uses absolute paths
    std::env::set_current_dir(work.path()).unwrap();

    let service = AnalysisService::new(store, ResultCache::new());
    let file = service.analyze_path(Path::new("5113")).unwrap();
    let build = service.analyze("5113").unwrap();
    assert_eq!(file.status, "FAILURE");
    assert_eq!(build.status, "SUCCESS");

    // And the other way round, both served from their caches
    assert_eq!(service.analyze("5113").unwrap().status, "SUCCESS");
    assert_eq!(
        service.analyze_path(Path::new("5113")).unwrap().status,
        "FAILURE"
    );
    assert_eq!(service.cache().len(), 1);
    assert_eq!(service.file_cache().len(), 1);
}

#[test]
fn test_from_config() {
    let (_dir, store) = store_with(&[]);
    let config = AnalyzerConfig {
        cache_ttl: Duration::from_secs(60),
        cache_capacity: Some(3),
        ..Default::default()
    };
    let service = AnalysisService::from_config(store, &config);
    assert_eq!(service.cache().ttl(), Duration::from_secs(60));
    assert_eq!(service.cache().capacity(), Some(3));
    assert_eq!(service.file_cache().ttl(), Duration::from_secs(60));
    assert_eq!(service.file_cache().capacity(), Some(3));
}

/// Store whose logs break after a few bytes, counting open calls
struct FlakyStore {
    opens: AtomicUsize,
}

struct BrokenReader {
    data: Cursor<Vec<u8>>,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::Other, "disk went away")),
            n => Ok(n),
        }
    }
}

impl LogStore for FlakyStore {
    fn open(&self, _build_id: &str) -> Result<OpenedLog, AnalysisError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(OpenedLog {
            reader: Box::new(BufReader::new(BrokenReader {
                data: Cursor::new(b"ERROR first\nERROR sec".to_vec()),
            })),
            content_length: 1000,
        })
    }

    fn metadata(&self, build_id: &str) -> Result<LogMetadata, AnalysisError> {
        Ok(LogMetadata {
            build_id: build_id.to_string(),
            path: PathBuf::from("memory"),
            content_length: 1000,
            last_modified: None,
        })
    }

    fn list(&self) -> Result<Vec<String>, AnalysisError> {
        Ok(vec![])
    }
}

#[test]
fn test_read_failure_is_propagated_and_not_cached() {
    let service = AnalysisService::new(
        FlakyStore {
            opens: AtomicUsize::new(0),
        },
        ResultCache::new(),
    );

    let err = service.analyze("7").unwrap_err();
    assert!(err.is_source_read());
    assert!(service.cache().is_empty());

    // Nothing cached, so the next request reads the log again
    let _ = service.analyze("7");
    assert_eq!(service.store().opens.load(Ordering::SeqCst), 2);
}

#[test]
fn test_concurrent_requests_share_cache() {
    let (_dir, store) = store_with(&[("1", SAMPLE_LOG), ("2", "ERROR only\n")]);
    let service = Arc::new(AnalysisService::new(store, ResultCache::new()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                let id = if i % 2 == 0 { "1" } else { "2" };
                service.analyze(id).unwrap().total_errors
            })
        })
        .collect();

    let totals: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (i, total) in totals.iter().enumerate() {
        assert_eq!(*total, if i % 2 == 0 { 2 } else { 1 });
    }
    assert_eq!(service.cache().len(), 2);
}

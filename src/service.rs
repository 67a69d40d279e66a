// src/service.rs
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::aggregate::{analyze_reader, BuildSummary};
use crate::cache::ResultCache;
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::store::{LogMetadata, LogStore};

/// Cache-first analysis of build logs looked up by build id.
///
/// Concurrent callers asking for the same uncached build each run their own
/// analysis; whichever finishes last owns the cache entry. Files analysed by
/// path have their own cache so a path can never shadow a build id.
pub struct AnalysisService<S> {
    store: S,
    cache: ResultCache<Arc<BuildSummary>>,
    file_cache: ResultCache<Arc<BuildSummary>>,
    buffer_size: usize,
}

impl<S: LogStore> AnalysisService<S> {
    /// The file cache takes the TTL and capacity of `cache`.
    pub fn new(store: S, cache: ResultCache<Arc<BuildSummary>>) -> Self {
        let mut file_cache = ResultCache::with_ttl(cache.ttl());
        if let Some(capacity) = cache.capacity() {
            file_cache = file_cache.with_capacity(capacity);
        }
        AnalysisService {
            store,
            cache,
            file_cache,
            buffer_size: 64 * 1024,
        }
    }

    pub fn from_config(store: S, config: &AnalyzerConfig) -> Self {
        let mut cache = ResultCache::with_ttl(config.cache_ttl);
        if let Some(capacity) = config.cache_capacity {
            cache = cache.with_capacity(capacity);
        }
        AnalysisService {
            buffer_size: config.buffer_size,
            ..Self::new(store, cache)
        }
    }

    /// Summary for `build_id`, from the cache when still fresh.
    ///
    /// A failed analysis leaves the cache untouched.
    pub fn analyze(&self, build_id: &str) -> Result<Arc<BuildSummary>, AnalysisError> {
        if let Some(summary) = self.cache.get(build_id) {
            return Ok(summary);
        }

        let started = Instant::now();
        let opened = self.store.open(build_id)?;
        let summary = Arc::new(analyze_reader(opened.reader, opened.content_length)?);

        tracing::info!(
            build_id,
            status = %summary.status,
            total_errors = summary.total_errors,
            total_warnings = summary.total_warnings,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analyzed build log"
        );

        self.cache.set(build_id, Arc::clone(&summary));
        Ok(summary)
    }

    /// Analyse a log file outside the store, cached under its path
    pub fn analyze_path(&self, path: &Path) -> Result<Arc<BuildSummary>, AnalysisError> {
        let key = path.display().to_string();
        if let Some(summary) = self.file_cache.get(&key) {
            return Ok(summary);
        }

        let file = File::open(path)?;
        let content_length = file.metadata()?.len();
        let reader = BufReader::with_capacity(self.buffer_size, file);
        let summary = Arc::new(analyze_reader(reader, content_length)?);

        tracing::info!(
            path = %key,
            total_errors = summary.total_errors,
            total_warnings = summary.total_warnings,
            "analyzed log file"
        );

        self.file_cache.set(key, Arc::clone(&summary));
        Ok(summary)
    }

    pub fn metadata(&self, build_id: &str) -> Result<LogMetadata, AnalysisError> {
        self.store.metadata(build_id)
    }

    pub fn available_builds(&self) -> Result<Vec<String>, AnalysisError> {
        self.store.list()
    }

    pub fn cache(&self) -> &ResultCache<Arc<BuildSummary>> {
        &self.cache
    }

    /// Results of [`AnalysisService::analyze_path`], keyed by path
    pub fn file_cache(&self) -> &ResultCache<Arc<BuildSummary>> {
        &self.file_cache
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

// src/store.rs
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::AnalysisError;

/// Extension of stored build logs
pub const LOG_EXTENSION: &str = "log";

/// An opened log ready to be read to exhaustion
pub struct OpenedLog {
    pub reader: Box<dyn BufRead + Send>,
    /// Size of the whole log in bytes
    pub content_length: u64,
}

impl std::fmt::Debug for OpenedLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedLog")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Size and modification time of a stored log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMetadata {
    pub build_id: String,
    pub path: PathBuf,
    pub content_length: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl LogMetadata {
    /// Last-modified time in HTTP date format, e.g. `Wed, 15 Nov 2023 10:00:00 GMT`
    pub fn last_modified_http(&self) -> Option<String> {
        self.last_modified
            .map(|ts| ts.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
    }
}

/// Where build logs come from
pub trait LogStore: Send + Sync {
    /// Open the log for `build_id`
    fn open(&self, build_id: &str) -> Result<OpenedLog, AnalysisError>;

    fn metadata(&self, build_id: &str) -> Result<LogMetadata, AnalysisError>;

    /// Build ids with a stored log, sorted
    fn list(&self) -> Result<Vec<String>, AnalysisError>;
}

/// Build ids become file names, so reject anything that could leave the log directory.
pub fn validate_build_id(build_id: &str) -> Result<(), AnalysisError> {
    let invalid = build_id.is_empty()
        || build_id == "."
        || build_id == ".."
        || build_id.contains(['/', '\\', '\0']);
    if invalid {
        return Err(AnalysisError::InvalidBuildId(build_id.to_string()));
    }
    Ok(())
}

/// Logs stored as `<dir>/<build id>.log` on local disk
#[derive(Debug, Clone)]
pub struct DirLogStore {
    dir: PathBuf,
    buffer_size: usize,
}

impl DirLogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirLogStore {
            dir: dir.into(),
            buffer_size: 64 * 1024,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn log_path(&self, build_id: &str) -> Result<PathBuf, AnalysisError> {
        validate_build_id(build_id)?;
        Ok(self.dir.join(format!("{}.{}", build_id, LOG_EXTENSION)))
    }

    fn not_found(&self, build_id: &str, path: PathBuf, err: std::io::Error) -> AnalysisError {
        if err.kind() == std::io::ErrorKind::NotFound {
            AnalysisError::LogNotFound {
                build_id: build_id.to_string(),
                path,
            }
        } else {
            AnalysisError::Io(err)
        }
    }
}

impl LogStore for DirLogStore {
    fn open(&self, build_id: &str) -> Result<OpenedLog, AnalysisError> {
        let path = self.log_path(build_id)?;
        let file = File::open(&path).map_err(|e| self.not_found(build_id, path.clone(), e))?;
        let content_length = file.metadata()?.len();

        tracing::debug!(build_id, path = %path.display(), content_length, "opened build log");

        Ok(OpenedLog {
            reader: Box::new(BufReader::with_capacity(self.buffer_size, file)),
            content_length,
        })
    }

    fn metadata(&self, build_id: &str) -> Result<LogMetadata, AnalysisError> {
        let path = self.log_path(build_id)?;
        let meta = fs::metadata(&path).map_err(|e| self.not_found(build_id, path.clone(), e))?;
        let last_modified = meta.modified().ok().map(DateTime::<Utc>::from);

        Ok(LogMetadata {
            build_id: build_id.to_string(),
            path,
            content_length: meta.len(),
            last_modified,
        })
    }

    fn list(&self) -> Result<Vec<String>, AnalysisError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(dir = %self.dir.display(), "log directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(AnalysisError::Io(e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

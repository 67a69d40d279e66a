use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The line source failed part-way; no summary is produced
    #[error("Failed to read log source: {source}")]
    SourceRead {
        #[source]
        source: std::io::Error,
    },

    #[error("No log found for build '{build_id}' at {}", .path.display())]
    LogNotFound { build_id: String, path: PathBuf },

    #[error("Invalid build id '{0}'")]
    InvalidBuildId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AnalysisError {
    pub fn source_read(source: std::io::Error) -> Self {
        AnalysisError::SourceRead { source }
    }

    /// True for failures while consuming an already opened log
    pub fn is_source_read(&self) -> bool {
        matches!(self, AnalysisError::SourceRead { .. })
    }
}

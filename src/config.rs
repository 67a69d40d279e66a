// src/config.rs
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::DEFAULT_TTL;
use crate::colors::ColorChoice;
use crate::error::AnalysisError;
use crate::report::OutputFormat;

/// Settings for the analyzer front end.
///
/// Every field has a default, so a YAML file only needs the keys it changes:
///
/// ```yaml
/// log_dir: /var/lib/build-logs
/// cache_ttl: 30m
/// cache_capacity: 256
/// format: json
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Directory holding `<build id>.log` files
    pub log_dir: PathBuf,
    #[serde(deserialize_with = "deserialize_duration")]
    pub cache_ttl: Duration,
    /// Maximum cached summaries; `null` for no limit
    pub cache_capacity: Option<usize>,
    pub buffer_size: usize,
    pub format: OutputFormat,
    pub color: ColorChoice,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            log_dir: PathBuf::from("build-logs"),
            cache_ttl: DEFAULT_TTL,
            cache_capacity: Some(1024),
            buffer_size: 65536, // 64KB
            format: OutputFormat::default(),
            color: ColorChoice::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, AnalysisError> {
        let config: AnalyzerConfig =
            serde_yaml::from_str(text).map_err(|e| AnalysisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.cache_ttl.is_zero() {
            return Err(AnalysisError::Config(
                "cache_ttl must be greater than zero".to_string(),
            ));
        }
        if self.buffer_size == 0 {
            return Err(AnalysisError::Config(
                "buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.cache_capacity == Some(0) {
            return Err(AnalysisError::Config(
                "cache_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Accepts humantime strings ("1h", "90s") or plain seconds
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => humantime::parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

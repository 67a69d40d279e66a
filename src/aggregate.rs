// src/aggregate.rs
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::BufRead;

use crate::classify::{classify, Category, StatusKind};
use crate::error::AnalysisError;
use crate::normalize::{normalize, NormalizedKey};
use crate::source::{LogLine, LogLines};

/// Maximum number of records returned by [`top_patterns`]
pub const TOP_PATTERN_LIMIT: usize = 10;

/// One distinct normalized line and how often it occurred
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRecord {
    /// First raw line that produced this pattern
    pub message: String,
    pub count: usize,
    /// Position of the first occurrence, formatted as `line N`
    pub first_seen: String,
}

impl PatternRecord {
    fn first(raw: &str, line_number: usize) -> Self {
        PatternRecord {
            message: raw.to_string(),
            count: 1,
            first_seen: format!("line {}", line_number),
        }
    }
}

/// Result of analysing one build log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    pub status: String,
    pub duration: String,
    pub content_length: u64,
    /// Distinct error lines in first-seen order (raw text)
    pub errors: Vec<String>,
    /// Distinct warning lines in first-seen order (raw text)
    pub warnings: Vec<String>,
    pub common_errors: Vec<PatternRecord>,
    pub common_warnings: Vec<PatternRecord>,
    pub total_errors: usize,
    pub total_warnings: usize,
    pub unique_errors: usize,
    pub unique_warnings: usize,
}

/// Frequency table for one category, keyed by normalized text.
///
/// Insertion order is first-seen order.
#[derive(Debug, Default)]
pub struct PatternTable {
    records: IndexMap<NormalizedKey, PatternRecord>,
    total: usize,
}

impl PatternTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence. Returns true if the key was new.
    pub fn record(&mut self, key: NormalizedKey, raw: &str, line_number: usize) -> bool {
        self.total += 1;
        match self.records.entry(key) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().count += 1;
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(PatternRecord::first(raw, line_number));
                true
            }
        }
    }

    pub fn get(&self, key: &NormalizedKey) -> Option<&PatternRecord> {
        self.records.get(key)
    }

    /// Total occurrences across all patterns
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct patterns
    pub fn unique(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &PatternRecord> {
        self.records.values()
    }

    /// Representative raw lines in first-seen order
    pub fn messages(&self) -> Vec<String> {
        self.records.values().map(|r| r.message.clone()).collect()
    }
}

/// Rank patterns for display.
///
/// Sorted by count descending; equal counts are ordered by comparing the
/// `first_seen` strings, so `"line 10"` sorts before `"line 2"`. Consumers
/// rely on this ordering. At most [`TOP_PATTERN_LIMIT`] records are returned.
pub fn top_patterns<'a, I>(records: I) -> Vec<PatternRecord>
where
    I: IntoIterator<Item = &'a PatternRecord>,
{
    let mut patterns: Vec<PatternRecord> = records.into_iter().cloned().collect();
    patterns.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.first_seen.cmp(&b.first_seen))
    });
    patterns.truncate(TOP_PATTERN_LIMIT);
    patterns
}

/// Accumulates classified lines for a single analysis run
#[derive(Debug, Default)]
pub struct Aggregator {
    errors: PatternTable,
    warnings: PatternTable,
    status: Option<String>,
    duration: Option<String>,
    lines_seen: usize,
    lines_blank: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Lines that normalize to nothing are ignored.
    pub fn push(&mut self, line: &LogLine) {
        self.lines_seen += 1;

        let key = normalize(&line.text);
        if key.is_empty() {
            self.lines_blank += 1;
            return;
        }

        match classify(key.as_str(), &line.text) {
            Category::Error => {
                self.errors.record(key, &line.text, line.number);
            }
            Category::Warning => {
                self.warnings.record(key, &line.text, line.number);
            }
            Category::Status {
                kind: StatusKind::BuildStatus,
                value,
            } => self.status = Some(value.to_string()),
            Category::Status {
                kind: StatusKind::Duration,
                value,
            } => self.duration = Some(value.to_string()),
            Category::Other => {}
        }
    }

    pub fn errors(&self) -> &PatternTable {
        &self.errors
    }

    pub fn warnings(&self) -> &PatternTable {
        &self.warnings
    }

    pub fn lines_seen(&self) -> usize {
        self.lines_seen
    }

    /// Lines dropped because nothing was left after normalization
    pub fn lines_blank(&self) -> usize {
        self.lines_blank
    }

    /// Build the summary. `content_length` is the byte size of the source.
    pub fn finish(self, content_length: u64) -> BuildSummary {
        BuildSummary {
            status: self.status.unwrap_or_default(),
            duration: self.duration.unwrap_or_default(),
            content_length,
            errors: self.errors.messages(),
            warnings: self.warnings.messages(),
            common_errors: top_patterns(self.errors.records()),
            common_warnings: top_patterns(self.warnings.records()),
            total_errors: self.errors.total(),
            total_warnings: self.warnings.total(),
            unique_errors: self.errors.unique(),
            unique_warnings: self.warnings.unique(),
        }
    }
}

/// Analyse a whole log read from `reader`.
///
/// Reads to exhaustion in file order. A read failure aborts the run with
/// [`AnalysisError::SourceRead`] and no partial summary.
pub fn analyze_reader<R: BufRead>(
    reader: R,
    content_length: u64,
) -> Result<BuildSummary, AnalysisError> {
    let mut aggregator = Aggregator::new();
    for line in LogLines::new(reader) {
        let line = line.map_err(AnalysisError::source_read)?;
        aggregator.push(&line);
    }

    tracing::debug!(
        lines = aggregator.lines_seen(),
        blank = aggregator.lines_blank(),
        errors = aggregator.errors().total(),
        warnings = aggregator.warnings().total(),
        "log analysis finished"
    );

    Ok(aggregator.finish(content_length))
}

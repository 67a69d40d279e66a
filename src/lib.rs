// src/lib.rs
pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod colors;
pub mod config;
pub mod error;
pub mod normalize;
pub mod report;
pub mod service;
pub mod source;
pub mod store;

pub use error::*;

pub use aggregate::{
    analyze_reader, top_patterns, Aggregator, BuildSummary, PatternRecord, PatternTable,
};
pub use cache::ResultCache;
pub use classify::{classify, Category, StatusKind};
pub use config::AnalyzerConfig;
pub use normalize::{normalize, NormalizedKey};
pub use report::{OutputFormat, ReportWriter};
pub use service::AnalysisService;
pub use source::{LogLine, LogLines};
pub use store::{DirLogStore, LogMetadata, LogStore, OpenedLog};

// src/report.rs
use serde::Deserialize;
use std::io::{self, Write};

use crate::aggregate::{BuildSummary, PatternRecord};
use crate::colors::ColorScheme;
use crate::store::LogMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    #[value(name = "text", help = "Human-readable report")]
    Text,
    #[value(name = "json", help = "One JSON object per build")]
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Writes analysis results in the selected format
pub struct ReportWriter {
    format: OutputFormat,
    colors: ColorScheme,
}

impl ReportWriter {
    pub fn new(format: OutputFormat, use_colors: bool) -> Self {
        ReportWriter {
            format,
            // JSON output is never colored
            colors: ColorScheme::new(use_colors && format == OutputFormat::Text),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn write_summary<W: Write>(
        &self,
        out: &mut W,
        build_id: &str,
        summary: &BuildSummary,
    ) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => self.write_text(out, build_id, summary),
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, summary)?;
                writeln!(out)
            }
        }
    }

    /// Report a failed analysis without stopping a stream of requests
    pub fn write_error<W: Write>(
        &self,
        out: &mut W,
        build_id: &str,
        message: &str,
    ) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                let c = &self.colors;
                writeln!(
                    out,
                    "{}Error analyzing {}:{} {}",
                    c.error, build_id, c.reset, message
                )
            }
            OutputFormat::Json => {
                let value = serde_json::json!({ "buildId": build_id, "error": message });
                serde_json::to_writer(&mut *out, &value)?;
                writeln!(out)
            }
        }
    }

    pub fn write_build_list<W: Write>(&self, out: &mut W, build_ids: &[String]) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                writeln!(out, "Available log files:")?;
                for (i, id) in build_ids.iter().enumerate() {
                    writeln!(out, "[{}] {}", i + 1, id)?;
                }
                Ok(())
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, build_ids)?;
                writeln!(out)
            }
        }
    }

    pub fn write_metadata<W: Write>(&self, out: &mut W, meta: &LogMetadata) -> io::Result<()> {
        let last_modified = meta.last_modified_http();
        match self.format {
            OutputFormat::Text => {
                let c = &self.colors;
                writeln!(out, "{}Build {}{}", c.heading, meta.build_id, c.reset)?;
                writeln!(out, "{}Path:{} {}", c.label, c.reset, meta.path.display())?;
                writeln!(
                    out,
                    "{}Content Length:{} {} bytes",
                    c.label, c.reset, meta.content_length
                )?;
                if let Some(ts) = last_modified {
                    writeln!(out, "{}Last Modified:{} {}", c.label, c.reset, ts)?;
                }
                Ok(())
            }
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "buildId": meta.build_id,
                    "contentLength": meta.content_length,
                    "contentType": "text/plain",
                    "lastModified": last_modified,
                });
                serde_json::to_writer(&mut *out, &value)?;
                writeln!(out)
            }
        }
    }

    fn write_text<W: Write>(
        &self,
        out: &mut W,
        build_id: &str,
        summary: &BuildSummary,
    ) -> io::Result<()> {
        let c = &self.colors;

        writeln!(out, "\n{}Build Analysis for {}:{}", c.heading, build_id, c.reset)?;
        writeln!(
            out,
            "{}Status:{} {}{}{}",
            c.label,
            c.reset,
            c.status(&summary.status),
            summary.status,
            c.reset
        )?;
        writeln!(out, "{}Duration:{} {}", c.label, c.reset, summary.duration)?;
        writeln!(
            out,
            "{}Content Length:{} {} bytes",
            c.label, c.reset, summary.content_length
        )?;

        writeln!(out, "\n{}Error Summary:{}", c.heading, c.reset)?;
        writeln!(out, "Total Errors: {}{}{}", c.error, summary.total_errors, c.reset)?;
        writeln!(out, "Unique Errors: {}", summary.unique_errors)?;

        writeln!(out, "\n{}Warning Summary:{}", c.heading, c.reset)?;
        writeln!(
            out,
            "Total Warnings: {}{}{}",
            c.warning, summary.total_warnings, c.reset
        )?;
        writeln!(out, "Unique Warnings: {}", summary.unique_warnings)?;

        writeln!(out, "\n{}Top Common Errors:{}", c.heading, c.reset)?;
        self.write_patterns(out, &summary.common_errors)?;

        if !summary.common_warnings.is_empty() {
            writeln!(out, "\n{}Top Common Warnings:{}", c.heading, c.reset)?;
            self.write_patterns(out, &summary.common_warnings)?;
        }

        Ok(())
    }

    fn write_patterns<W: Write>(&self, out: &mut W, patterns: &[PatternRecord]) -> io::Result<()> {
        let c = &self.colors;
        for pattern in patterns {
            writeln!(
                out,
                "[{}{} occurrences{}] {}",
                c.count, pattern.count, c.reset, pattern.message
            )?;
        }
        Ok(())
    }
}

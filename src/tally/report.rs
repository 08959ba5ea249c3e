//! Run reports and their output formats

use super::aggregator::TableSummary;
use super::table::{MostCommon, WordCount};
use crate::config::FailurePolicy;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Summary of a complete tally run
#[derive(Debug, Clone, Serialize)]
pub struct TallyReport {
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    pub documents: usize,
    /// Documents read and counted, whether or not the policy kept them
    pub succeeded: usize,
    pub failed: usize,
    /// Documents folded into the global table
    pub aggregated: usize,
    pub failure_policy: FailurePolicy,
    pub total_words: u64,
    pub unique_words: usize,
    pub most_common: MostCommon,
    pub top: Vec<WordCount>,
    pub per_document: Vec<TableSummary>,
    pub failures: Vec<String>,
}

impl TallyReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// How a report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-pretty" | "pretty" => Ok(Self::JsonPretty),
            other => Err(format!(
                "unknown format '{other}' (expected text, json or json-pretty)"
            )),
        }
    }
}

/// Renders a [`TallyReport`]
pub struct ReportFormatter {
    format: OutputFormat,
}

impl ReportFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, report: &TallyReport) -> serde_json::Result<String> {
        match self.format {
            OutputFormat::Text => Ok(report.to_string()),
            OutputFormat::Json => serde_json::to_string(report),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(report),
        }
    }
}

impl fmt::Display for TallyReport {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "=== Word Tally ===")?;
        writeln!(
            out,
            "Documents: {} ({} counted, {} failed, {} aggregated)",
            self.documents, self.succeeded, self.failed, self.aggregated
        )?;
        writeln!(out, "Elapsed: {:.3}s", self.elapsed.as_secs_f64())?;
        writeln!(out, "Total words: {}", self.total_words)?;
        writeln!(out, "Unique words: {}", self.unique_words)?;
        if self.most_common.is_empty() {
            writeln!(out, "Most common: (none)")?;
        } else {
            writeln!(out, "Most common: {}", self.most_common)?;
        }

        if !self.top.is_empty() {
            writeln!(out)?;
            writeln!(out, "Top {}:", self.top.len())?;
            let width = self
                .top
                .iter()
                .map(|row| row.count.to_string().len())
                .max()
                .unwrap_or(1);
            for row in &self.top {
                writeln!(out, "  {:>width$}  {}", row.count, row.word_lossy())?;
            }
        }

        if !self.per_document.is_empty() {
            writeln!(out)?;
            writeln!(out, "Documents:")?;
            let mut rows: Vec<&TableSummary> = self.per_document.iter().collect();
            rows.sort_by(|a, b| a.document.cmp(&b.document));
            for row in rows {
                writeln!(
                    out,
                    "  ✓ {} ({:.2}s) {} unique, most common {}",
                    row.document,
                    row.duration.as_secs_f64(),
                    row.unique_words,
                    row.most_common
                )?;
            }
        }

        if !self.failures.is_empty() {
            writeln!(out)?;
            writeln!(out, "Failures:")?;
            for failure in &self.failures {
                writeln!(out, "  ✗ {failure}")?;
            }
        }

        Ok(())
    }
}

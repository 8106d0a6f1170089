//! Run report accumulation and serialization

#![allow(clippy::uninlined_format_args)]

use crate::domain::{Category, DownloadOutcome};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Aggregate counts; `successful` includes files that were already present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_processed: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub successful: usize,
    /// Percentage of successful entries, 0 for an empty run
    pub success_rate: f64,
}

/// Fresh downloads per category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub transparent: usize,
    pub opaque: usize,
    pub opal: usize,
    pub unknown: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Transparent => self.transparent,
            Category::Opaque => self.opaque,
            Category::Opal => self.opal,
            Category::Unknown => self.unknown,
        }
    }

    fn increment(&mut self, category: Category) {
        let slot = match category {
            Category::Transparent => &mut self.transparent,
            Category::Opaque => &mut self.opaque,
            Category::Opal => &mut self.opal,
            Category::Unknown => &mut self.unknown,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// Accumulated outcomes of one run, in arrival order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub summary: RunSummary,
    pub by_type: CategoryCounts,
    pub results: Vec<DownloadOutcome>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            summary: RunSummary::default(),
            by_type: CategoryCounts::default(),
            results: Vec::new(),
        }
    }

    /// Append an outcome and update every count
    pub fn record(&mut self, outcome: DownloadOutcome) {
        match &outcome {
            DownloadOutcome::Downloaded { .. } => self.summary.downloaded += 1,
            DownloadOutcome::Failed { .. } => self.summary.failed += 1,
            DownloadOutcome::Skipped { .. } => self.summary.skipped += 1,
        }
        if let Some(category) = outcome.downloaded_category() {
            self.by_type.increment(category);
        }
        if outcome.is_success() {
            self.summary.successful += 1;
        }

        self.results.push(outcome);
        self.summary.total_processed = self.results.len();
        self.summary.success_rate = if self.summary.total_processed == 0 {
            0.0
        } else {
            self.summary.successful as f64 / self.summary.total_processed as f64 * 100.0
        };
    }

    /// Write pretty JSON (trailing newline) through a temporary sibling file
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        json.push('\n');

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write report: {:?}", tmp))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to write report: {:?}", path))?;
        Ok(())
    }

    /// Human-readable end-of-run summary
    pub fn render_console_summary(&self, report_path: &Path) -> String {
        let rule = "=".repeat(60);
        let mut out = String::new();

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "DOWNLOAD COMPLETE");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "Total processed: {}", self.summary.total_processed);
        let _ = writeln!(out, "Downloaded: {}", self.summary.downloaded);
        let _ = writeln!(out, "Already present: {}", self.summary.skipped);
        let _ = writeln!(out, "Failed: {}", self.summary.failed);
        let _ = writeln!(out, "Success rate: {:.1}%", self.summary.success_rate);

        let counts: Vec<_> = Category::ALL
            .iter()
            .map(|c| (*c, self.by_type.get(*c)))
            .filter(|(_, n)| *n > 0)
            .collect();
        if !counts.is_empty() {
            let _ = writeln!(out, "\nBy type:");
            for (category, n) in counts {
                let _ = writeln!(out, "- {}: {}", category, n);
            }
        }

        let _ = writeln!(out, "\nDetailed report saved to: {}", report_path.display());
        out
    }
}

//! Report exporters for JSON, CSV, and Markdown.
//!
//! # Submodules
//!
//! - [`json`]: Full report envelope, pretty-printed, for downstream tooling
//! - [`csv`]: One row per article, spreadsheet-friendly
//! - [`markdown`]: Human-readable digest with tweet drafts
//!
//! # Output Structure
//!
//! Files are grouped by run date, named after the topic:
//! ```text
//! reports/
//! └── 2026-08-22/
//!     ├── bitcoin_news.json
//!     ├── bitcoin_news.csv
//!     └── bitcoin_news.md
//! ```
//!
//! Re-running the same topic on the same day overwrites the earlier files.
//! Watch mode instead writes one file set per cycle, with
//! `_cycle<NNN>` appended to the stem.

pub mod csv;
pub mod json;
pub mod markdown;

use chrono::Utc;
use std::error::Error;
use tracing::{info, instrument};

use crate::models::NewsReport;
use crate::utils::{ensure_writable_dir, safe_file_stem};

/// Which formats a run writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportFormats {
    pub json: bool,
    pub csv: bool,
    pub markdown: bool,
}

impl ExportFormats {
    pub fn any(&self) -> bool {
        self.json || self.csv || self.markdown
    }
}

/// Destination directory plus format selection for one run's reports.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    formats: ExportFormats,
    output_dir: String,
}

impl ExportPlan {
    pub fn new(formats: ExportFormats, output_dir: &str) -> Self {
        ExportPlan {
            formats,
            output_dir: output_dir.to_string(),
        }
    }

    pub fn formats(&self) -> ExportFormats {
        self.formats
    }

    /// `{output_dir}/{YYYY-MM-DD}` for today's reports.
    fn dated_dir(&self) -> String {
        format!("{}/{}", self.output_dir, Utc::now().format("%Y-%m-%d"))
    }

    /// Write every enabled format for this report.
    ///
    /// Returns the paths written. A plan with no formats enabled writes
    /// nothing and touches no directories.
    #[instrument(level = "info", skip_all, fields(topic = %report.topic))]
    pub async fn write_all(&self, report: &NewsReport) -> Result<Vec<String>, Box<dyn Error>> {
        let stem = format!("{}_news", safe_file_stem(&report.topic));
        self.write_named(report, &stem).await
    }

    /// Write one watch cycle's delta under a cycle-stamped name, leaving
    /// earlier cycles' files in place.
    #[instrument(level = "info", skip_all, fields(topic = %report.topic, cycle = cycle))]
    pub async fn write_cycle(
        &self,
        report: &NewsReport,
        cycle: u64,
    ) -> Result<Vec<String>, Box<dyn Error>> {
        let stem = format!("{}_news_cycle{:03}", safe_file_stem(&report.topic), cycle);
        self.write_named(report, &stem).await
    }

    async fn write_named(
        &self,
        report: &NewsReport,
        stem: &str,
    ) -> Result<Vec<String>, Box<dyn Error>> {
        let mut written = Vec::new();
        if !self.formats.any() {
            return Ok(written);
        }

        let dir = self.dated_dir();
        ensure_writable_dir(&dir).await?;

        if self.formats.json {
            let path = format!("{}/{}.json", dir, stem);
            json::write_report(report, &path).await?;
            written.push(path);
        }
        if self.formats.csv {
            let path = format!("{}/{}.csv", dir, stem);
            csv::write_report(report, &path).await?;
            written.push(path);
        }
        if self.formats.markdown {
            let path = format!("{}/{}.md", dir, stem);
            markdown::write_report(report, &path).await?;
            written.push(path);
        }

        info!(files = written.len(), "report files written");
        Ok(written)
    }
}

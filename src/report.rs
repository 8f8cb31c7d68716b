/*!
 * Reporting functionality for HashWatch
 *
 * Renders change classifications for the console or as JSON, and a summary
 * table after a baseline has been recorded.
 */

use std::fmt::Write;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};
use strum::IntoEnumIterator;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::types::{ChangeKind, Classification};
use crate::utils::format_file_size;

/// Summary of a freshly recorded baseline
#[derive(Debug, Clone)]
pub struct BaselineReport {
    /// Location of the baseline document
    pub baseline_file: PathBuf,
    /// Number of files recorded
    pub files_recorded: usize,
    /// Sum of recorded file sizes
    pub total_size: u64,
    /// Files recorded without a content hash
    pub files_unreadable: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Time spent walking and hashing
    pub scan_duration: Duration,
    /// Time taken to scan and write
    pub duration: Duration,
}

/// Format of the report output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Marker lines for a terminal
    Console,
    /// Serialized classification
    Json,
}

/// Report generator for change classifications
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Render the result of a single check
    pub fn render_classification(&self, classification: &Classification) -> String {
        match self.format {
            ReportFormat::Console => {
                if classification.is_empty() {
                    let mut out = String::from("No changes detected");
                    self.write_degraded(classification, &mut out);
                    out
                } else {
                    self.render_changes(classification)
                }
            }
            ReportFormat::Json => self.render_json(classification),
        }
    }

    /// Render one monitor iteration that found changes
    pub fn render_tick(&self, classification: &Classification, at: DateTime<Local>) -> String {
        match self.format {
            ReportFormat::Console => format!(
                "\nChanges detected at {}\n{}",
                at.format("%Y-%m-%d %H:%M:%S%.6f"),
                self.render_changes(classification)
            ),
            ReportFormat::Json => self.render_json(classification),
        }
    }

    /// Print the result of a single check to stdout
    pub fn print_classification(&self, classification: &Classification) {
        println!("{}", self.render_classification(classification));
    }

    fn render_json(&self, classification: &Classification) -> String {
        // Classification only holds strings, serialization cannot fail
        serde_json::to_string_pretty(classification).unwrap_or_default()
    }

    // Marker sections for every non-empty category
    fn render_changes(&self, classification: &Classification) -> String {
        let mut out = String::new();

        for kind in ChangeKind::iter() {
            let entries = classification.entries(kind);
            if entries.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n{}:", kind);
            for entry in entries {
                let _ = writeln!(out, "  {} {}", kind.marker(), entry);
            }
        }

        self.write_degraded(classification, &mut out);
        out.trim_end().to_string()
    }

    fn write_degraded(&self, classification: &Classification, out: &mut String) {
        if classification.degraded.is_empty() {
            return;
        }
        let _ = writeln!(
            out,
            "\nCompared by path only (content could not be hashed):"
        );
        for path in &classification.degraded {
            let _ = writeln!(out, "  ? {}", path);
        }
    }

    /// Summary table printed after `create`
    pub fn render_baseline_summary(&self, report: &BaselineReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let rows = vec![
            SummaryRow {
                key: "Baseline File".to_string(),
                value: report.baseline_file.display().to_string(),
            },
            SummaryRow {
                key: "Files Recorded".to_string(),
                value: report.files_recorded.to_string(),
            },
            SummaryRow {
                key: "Total Size".to_string(),
                value: format_file_size(report.total_size),
            },
            SummaryRow {
                key: "Unreadable Files".to_string(),
                value: report.files_unreadable.to_string(),
            },
            SummaryRow {
                key: "Bytes Hashed".to_string(),
                value: format_file_size(report.bytes_hashed),
            },
            SummaryRow {
                key: "Scan Time".to_string(),
                value: format!("{:.4?}", report.scan_duration),
            },
            SummaryRow {
                key: "Process Time".to_string(),
                value: format!("{:.4?}", report.duration),
            },
        ];

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        format!("BASELINE CREATED\n{}", table)
    }
}

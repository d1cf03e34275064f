//! JSON output formatter

use super::OutputFormatter;
use crate::engine::{CheckReport, CheckRun};
use crate::rule::CheckResult;
use serde::Serialize;

/// JSON formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    files: Vec<JsonFile<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    file: String,
    checks: &'a [CheckResult],
    failed: usize,
}

#[derive(Serialize)]
struct JsonSummary {
    files_checked: usize,
    failed_checks: usize,
    duration_ms: u128,
}

impl<'a> From<&'a CheckReport> for JsonFile<'a> {
    fn from(report: &'a CheckReport) -> Self {
        Self {
            file: report.file.display().to_string(),
            checks: &report.results,
            failed: report.failed_count(),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, run: &CheckRun) -> String {
        let output = JsonOutput {
            files: run.reports.iter().map(JsonFile::from).collect(),
            summary: JsonSummary {
                files_checked: run.files_checked(),
                failed_checks: run.failed_count(),
                duration_ms: run.duration.as_millis(),
            },
        };
        let mut rendered = self.render(&output);
        rendered.push('\n');
        rendered
    }

    fn format_report(&self, report: &CheckReport) -> String {
        self.render(&JsonFile::from(report))
    }
}

//! Human-readable text output formatter

use super::OutputFormatter;
use crate::engine::{CheckReport, CheckRun};
use crate::rule::CheckResult;
use colored::*;

const PASS_MARK: &str = "✔";
const FAIL_MARK: &str = "✘";

/// Text formatter with optional color support
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self { colored: true }
    }
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn mark(&self, passed: bool) -> String {
        match (passed, self.colored) {
            (true, true) => PASS_MARK.green().to_string(),
            (false, true) => FAIL_MARK.red().to_string(),
            (true, false) => PASS_MARK.to_string(),
            (false, false) => FAIL_MARK.to_string(),
        }
    }

    fn format_result(&self, result: &CheckResult) -> String {
        format!(
            "{}: {} {}\n",
            result.title,
            result.observed_value,
            self.mark(result.passed)
        )
    }

    fn summary(&self, failed: usize) -> String {
        if failed == 0 {
            let s = "All checks are ok";
            return if self.colored {
                format!("{}\n", s.green().bold())
            } else {
                format!("{}\n", s)
            };
        }

        let s = format!(
            "Found {} {}",
            failed,
            if failed == 1 { "issue" } else { "issues" }
        );
        if self.colored {
            format!("{}\n", s.red().bold())
        } else {
            format!("{}\n", s)
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, run: &CheckRun) -> String {
        let mut output = String::new();
        let show_file = run.reports.len() > 1;

        for report in &run.reports {
            if show_file {
                let header = report.file.display().to_string();
                if self.colored {
                    output.push_str(&format!("{}\n", header.underline()));
                } else {
                    output.push_str(&format!("{}\n", header));
                }
            }
            output.push_str(&self.format_report(report));
            if show_file {
                output.push('\n');
            }
        }

        output.push_str(&self.summary(run.failed_count()));
        output
    }

    fn format_report(&self, report: &CheckReport) -> String {
        report
            .results
            .iter()
            .map(|result| self.format_result(result))
            .collect()
    }
}

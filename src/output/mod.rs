//! Output formatters for check results

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::engine::{CheckReport, CheckRun};

/// Output formatter trait
pub trait OutputFormatter: Send + Sync {
    /// Format the results of a whole run
    fn format(&self, run: &CheckRun) -> String;

    /// Format the results of one file
    fn format_report(&self, report: &CheckReport) -> String;
}

//! Output formatting for scan reports (human/JSON).

use std::fmt::Write as _;

use super::ScanReport;
use crate::core::BuildStatus;

/// Width of the status tag column, including padding.
const TAG_WIDTH: usize = 9;

/// Output format for scan reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// Machine-readable JSON output
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = OutputFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            _ => Err(OutputFormatParseError(s.to_string())),
        }
    }
}

/// Error parsing output format option.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid output format '{0}', valid values: human, json")]
pub struct OutputFormatParseError(pub String);

/// Bracketed status tag, padded to a fixed width.
pub fn status_tag(status: BuildStatus, color: bool) -> String {
    let (text, code) = match status {
        BuildStatus::Success => ("[OK]", "\x1b[1;32m"),
        BuildStatus::Failure => ("[FAIL]", "\x1b[1;31m"),
        BuildStatus::Pending => ("[PENDING]", "\x1b[1;33m"),
    };

    if color {
        format!("{}{:<width$}\x1b[0m", code, text, width = TAG_WIDTH)
    } else {
        format!("{:<width$}", text, width = TAG_WIDTH)
    }
}

/// Format a scan report for display (human-readable).
///
/// Combination lines come first, in planning order, followed by consistency
/// faults, collected diagnostics and the summary line. A report with none
/// of these formats to an empty string.
pub fn format_report(report: &ScanReport, color: bool) -> String {
    let mut output = String::new();
    if report.combinations.is_empty() && report.faults.is_empty() && report.warnings.is_empty() {
        return output;
    }

    for result in &report.combinations {
        let _ = writeln!(
            output,
            "{} {}",
            status_tag(result.status(), color),
            result.description()
        );
    }

    if !report.faults.is_empty() {
        let _ = writeln!(output, "\nConsistency faults:");
        for fault in &report.faults {
            let _ = writeln!(output, "  - {}", fault);
        }
    }

    if !report.warnings.is_empty() {
        output.push('\n');
        for diagnostic in report.warnings.iter() {
            output.push_str(&diagnostic.format(color));
        }
    }

    output.push('\n');
    let _ = writeln!(output, "{}", report.summary);

    output
}

/// Format a scan report as JSON.
pub fn format_report_json(report: &ScanReport) -> String {
    serde_json::to_string_pretty(report)
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize report: {}"}}"#, e))
}

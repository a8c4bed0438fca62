//! Text and JSON report generation.

use crate::models::{AggregateResult, RunReport};
use anyhow::Result;

/// The two-line summary for one strategy.
///
/// ```text
/// Multithreading:
///     Downloaded 80 sites (1234567 bytes) in 3.21 seconds
/// ```
///
/// Failures only show up as a lower site count here; `failed_count` is in
/// the JSON report.
pub fn summary_line(label: &str, result: &AggregateResult) -> String {
    format!(
        "{}:\n\tDownloaded {} sites ({} bytes) in {} seconds",
        label, result.request_count, result.total_bytes, result.elapsed_seconds
    )
}

/// Generate a JSON report.
pub fn generate_json_report(runs: &[RunReport]) -> Result<String> {
    serde_json::to_string_pretty(runs).map_err(Into::into)
}

//! JSON output helpers.

use anyhow::{Context, Result};

use crate::domain::FleetReport;

/// Format the fleet report, tagged with its outcome.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_report(report: &FleetReport) -> Result<String> {
    let mut obj = serde_json::to_value(report).context("JSON serialization failed")?;
    if let Some(map) = obj.as_object_mut() {
        map.insert(
            "outcome".to_string(),
            serde_json::to_value(report.outcome()).context("JSON serialization failed")?,
        );
    }
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

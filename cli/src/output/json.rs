//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed document to
//! stdout; failures print the error object from [`format_error`].

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::services::client_setup::BlockResult;
use crate::application::services::lifecycle::ResourceOverview;
use crate::application::services::rebuild::RebuildOutcome;
use crate::domain::VerificationReport;

/// Renders results as JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_status(&self, view: &ResourceOverview) -> Result<()> {
        print_json(view)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_verification(&self, report: &VerificationReport) -> Result<()> {
        print_json(&serde_json::json!({
            "passed": report.passed_count(),
            "total": report.results.len(),
            "checks": report.results,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_rebuild(&self, outcome: &RebuildOutcome) -> Result<()> {
        print_json(outcome)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_client_setup(&self, results: &[BlockResult]) -> Result<()> {
        print_json(&serde_json::json!({ "files": results }))
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    println!("{text}");
    Ok(())
}

/// Format a JSON error object:
///
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

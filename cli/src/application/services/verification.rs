//! Post-build verification: every check runs, none can abort the run.

use crate::application::ports::{ExecContext, ProgressReporter};
use crate::application::services::stderr_tail;
use crate::domain::{CheckResult, VerificationCheck, VerificationReport};

/// Run each check in order against `ctx`, collecting a result per check.
pub async fn run(checks: &[VerificationCheck], ctx: &impl ExecContext) -> VerificationReport {
    let mut results = Vec::with_capacity(checks.len());
    for check in checks {
        results.push(run_check(check, ctx).await);
    }
    VerificationReport { results }
}

async fn run_check(check: &VerificationCheck, ctx: &impl ExecContext) -> CheckResult {
    let argv = check.probe.argv();
    let args: Vec<&str> = argv.iter().map(String::as_str).collect();
    let (passed, detail) = match ctx.exec(&args).await {
        Ok(output) if output.status.success() => (true, None),
        Ok(output) => {
            let tail = stderr_tail(&output);
            let detail = match (output.status.code(), tail.is_empty()) {
                (Some(code), true) => format!("exit code {code}"),
                (Some(code), false) => format!("exit code {code}: {tail}"),
                (None, _) => "terminated by signal".to_string(),
            };
            (false, Some(detail))
        }
        Err(e) => (false, Some(format!("{e:#}"))),
    };
    tracing::debug!(check = %check.name, passed, "verification check");
    CheckResult {
        name: check.name.clone(),
        passed,
        detail,
    }
}

/// Render the checklist and its `passed/total` summary.
pub fn report(report: &VerificationReport, reporter: &impl ProgressReporter) {
    for result in &report.results {
        if result.passed {
            reporter.success(&result.name);
        } else {
            match &result.detail {
                Some(detail) => reporter.error(&format!("{} ({detail})", result.name)),
                None => reporter.error(&result.name),
            }
        }
    }
    let summary = format!(
        "{}/{} checks passed",
        report.passed_count(),
        report.results.len()
    );
    if report.all_passed() {
        reporter.info(&summary);
    } else {
        reporter.warn(&summary);
    }
}

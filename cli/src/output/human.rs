//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::application::services::client_setup::BlockResult;
use crate::application::services::lifecycle::ResourceOverview;
use crate::application::services::rebuild::RebuildOutcome;
use crate::domain::VerificationReport;
use crate::output::OutputContext;

/// Renders results as terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render resource status and address.
    pub fn render_status(&self, hostname: &str, view: &ResourceOverview) {
        self.ctx.kv("Resource:", &format!("{} ({hostname})", view.id));
        self.ctx.kv("Status:  ", &view.status.to_string());
        let address = view
            .address
            .map_or_else(|| "-".to_string(), |a| a.to_string());
        self.ctx.kv("Address: ", &address);
    }

    /// Render a ✓/✗ checklist with a `passed/total` summary line.
    pub fn render_verification(&self, report: &VerificationReport) {
        if self.ctx.quiet {
            return;
        }
        for result in &report.results {
            if result.passed {
                println!("  {} {}", "✓".style(self.ctx.styles.success), result.name);
            } else {
                let detail = result
                    .detail
                    .as_deref()
                    .map(|d| format!(" {}", format!("({d})").style(self.ctx.styles.dim)))
                    .unwrap_or_default();
                println!(
                    "  {} {}{detail}",
                    "✗".style(self.ctx.styles.error),
                    result.name
                );
            }
        }
        println!();
        let summary = format!(
            "{}/{} checks passed",
            report.passed_count(),
            report.results.len()
        );
        if report.all_passed() {
            self.ctx.success(&summary);
        } else {
            self.ctx.warn(&summary);
        }
    }

    /// Closing lines of a rebuild. The stage narrative was already printed.
    pub fn render_rebuild(&self, outcome: &RebuildOutcome) {
        match outcome {
            RebuildOutcome::Completed {
                report, address, ..
            } => {
                println!();
                match address {
                    Some(a) => self.ctx.success(&format!("Sandbox rebuilt at {a}")),
                    None => self.ctx.success("Sandbox rebuilt (no address yet)"),
                }
                if !report.all_passed() {
                    self.ctx.warn(&format!(
                        "Failed checks: {}",
                        report.failures().join(", ")
                    ));
                }
            }
            RebuildOutcome::Aborted { .. } => {
                self.ctx.info("Rebuild cancelled.");
            }
        }
    }

    /// One line per file touched by client setup.
    pub fn render_client_setup(&self, results: &[BlockResult]) {
        let added = results.iter().filter(|r| r.installed).count();
        if added == 0 {
            self.ctx.info("Workstation already configured; nothing changed.");
        } else {
            self.ctx
                .info("Open a new shell (or source your profile) to use the alias.");
        }
    }
}

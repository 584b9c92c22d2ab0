//! Full rebuild workflow: preflight, reconcile, create, provision, service,
//! clone, verify, and report.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::fmt;
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{ExecContext, OperatorPrompt, ProgressReporter, ResourceHost};
use crate::application::services::context::ResourceContext;
use crate::application::services::lifecycle::{
    self, ReadyState, ReadyTiming, ReconcileOutcome, ReconcilePolicy,
};
use crate::application::services::{pipeline, verification};
use crate::domain::{
    PhasePlan, Probe, ProvisionError, ResourceStatus, SandboxConfig, VerificationReport, recipe,
};

/// Stages of a rebuild, in execution order. Each stage runs only after its
/// predecessor succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildStage {
    Preflight,
    ReconcileResource,
    CreateResource,
    RunPipeline,
    InstallService,
    CloneExternalState,
    Verify,
    ReportManualSteps,
}

impl RebuildStage {
    pub const ALL: [Self; 8] = [
        Self::Preflight,
        Self::ReconcileResource,
        Self::CreateResource,
        Self::RunPipeline,
        Self::InstallService,
        Self::CloneExternalState,
        Self::Verify,
        Self::ReportManualSteps,
    ];

    /// The stage that follows `self`, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        let idx = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(idx + 1).copied()
    }
}

impl fmt::Display for RebuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Preflight => "Preflight",
            Self::ReconcileResource => "Existing resource",
            Self::CreateResource => "Create resource",
            Self::RunPipeline => "Provision",
            Self::InstallService => "Interactive service",
            Self::CloneExternalState => "External state",
            Self::Verify => "Verification",
            Self::ReportManualSteps => "Next steps",
        };
        f.write_str(s)
    }
}

/// What a rebuild run ended with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RebuildOutcome {
    Completed {
        /// Verification results; failures here never fail the run.
        report: VerificationReport,
        address: Option<Ipv4Addr>,
        phases_run: usize,
        manual_steps: Vec<String>,
    },
    /// The operator declined to destroy the existing resource.
    Aborted { status: ResourceStatus },
}

/// Collaborators for one rebuild.
pub struct Orchestrator<'a, H, L, P, R> {
    host: &'a H,
    local: &'a L,
    prompt: &'a P,
    reporter: &'a R,
}

impl<'a, H, L, P, R> Orchestrator<'a, H, L, P, R>
where
    H: ResourceHost,
    L: ExecContext,
    P: OperatorPrompt,
    R: ProgressReporter,
{
    pub fn new(host: &'a H, local: &'a L, prompt: &'a P, reporter: &'a R) -> Self {
        Self {
            host,
            local,
            prompt,
            reporter,
        }
    }

    /// Run the whole rebuild for `config`, with script payloads resolved
    /// against `payload_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] (inside `anyhow`) for preflight, mutation,
    /// and phase failures. A declined confirmation is not an error.
    pub async fn rebuild(
        &self,
        config: &SandboxConfig,
        payload_dir: &Path,
        policy: ReconcilePolicy,
    ) -> Result<RebuildOutcome> {
        let id = config.resource.id;
        let provision = recipe::provision_plan(config, payload_dir);

        self.enter(RebuildStage::Preflight);
        preflight(self.local, config, &provision, self.reporter).await?;

        self.enter(RebuildStage::ReconcileResource);
        let reconciled =
            lifecycle::reconcile(self.host, self.prompt, self.reporter, id, policy).await?;
        if let ReconcileOutcome::Declined { status } = reconciled {
            self.reporter
                .info(&format!("leaving resource {id} as it is; nothing changed"));
            return Ok(RebuildOutcome::Aborted { status });
        }

        self.enter(RebuildStage::CreateResource);
        lifecycle::create(self.host, self.reporter, id, &config.resource.spec()).await?;
        let address =
            match lifecycle::await_ready(self.host, self.reporter, id, (&config.wait).into())
                .await?
            {
                ReadyState::Ready { address } => Some(address),
                ReadyState::NoAddress => None,
                ReadyState::NotRunning { last } => {
                    return Err(ProvisionError::Mutation {
                        action: "start",
                        id,
                        detail: format!(
                            "still {last} after {}s",
                            ReadyTiming::from(&config.wait).boot_timeout.as_secs()
                        ),
                    }
                    .into());
                }
            };

        let resource = ResourceContext::new(self.host, id);

        self.enter(RebuildStage::RunPipeline);
        let mut phases_run = self.run_plan(&provision, &resource).await?;

        self.enter(RebuildStage::InstallService);
        let unit = stage_text(&recipe::service_unit(config))?;
        phases_run += self
            .run_plan(&recipe::service_plan(config, unit.path()), &resource)
            .await?;

        self.enter(RebuildStage::CloneExternalState);
        match recipe::clone_plan(config) {
            Some(plan) => phases_run += self.run_plan(&plan, &resource).await?,
            None => self
                .reporter
                .info("no repository configured (clone.repository); skipping"),
        }

        self.enter(RebuildStage::Verify);
        let report =
            verification::run(&recipe::verification_checks(config), &resource).await;
        verification::report(&report, self.reporter);

        self.enter(RebuildStage::ReportManualSteps);
        let manual_steps = recipe::manual_steps(config);
        for (n, step) in manual_steps.iter().enumerate() {
            self.reporter.info(&format!("{}. {step}", n + 1));
        }

        Ok(RebuildOutcome::Completed {
            report,
            address,
            phases_run,
            manual_steps,
        })
    }

    fn enter(&self, stage: RebuildStage) {
        tracing::info!(?stage, "entering rebuild stage");
        self.reporter.header(&stage.to_string());
    }

    async fn run_plan(&self, plan: &PhasePlan, resource: &impl ExecContext) -> Result<usize> {
        let summary = pipeline::run(plan, self.local, resource, self.reporter)
            .await
            .map_err(ProvisionError::from)?;
        Ok(summary.completed)
    }
}

// ── Preflight ────────────────────────────────────────────────────────────────

/// Checks that must hold before anything on the host is changed.
///
/// # Errors
///
/// Returns [`ProvisionError::Precondition`] naming the first unmet condition.
pub async fn preflight(
    local: &impl ExecContext,
    config: &SandboxConfig,
    plan: &PhasePlan,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    for tool in &config.preflight.required_tools {
        let argv = Probe::Tool(tool.clone()).argv();
        let args: Vec<&str> = argv.iter().map(String::as_str).collect();
        let found = local
            .exec(&args)
            .await
            .is_ok_and(|o| o.status.success());
        if !found {
            return Err(precondition(format!(
                "required host tool '{tool}' not found on PATH"
            )));
        }
    }
    reporter.step("host tooling present");

    if plan.is_empty() {
        return Err(precondition(
            "no provisioning phases defined (provision.phases is empty)".to_string(),
        ));
    }

    let mut missing = Vec::new();
    for (phase, payload) in plan.payloads() {
        if !tokio::fs::try_exists(&payload.local).await.unwrap_or(false) {
            missing.push(format!("{} (phase '{}')", payload.local.display(), phase.name));
        }
    }
    if !missing.is_empty() {
        return Err(precondition(format!(
            "payload files not found: {}",
            missing.join(", ")
        )));
    }
    reporter.step(&format!("{} phases planned, payloads present", plan.len()));

    if let Some(target) = &config.preflight.reachability_host {
        let reachable = local
            .exec(&["ping", "-c", "1", "-W", "3", target])
            .await
            .is_ok_and(|o| o.status.success());
        if !reachable {
            return Err(precondition(format!(
                "network unreachable: ping {target} failed"
            )));
        }
        reporter.step(&format!("{target} reachable"));
    }

    reporter.success("preflight passed");
    Ok(())
}

fn precondition(message: String) -> anyhow::Error {
    ProvisionError::Precondition(message).into()
}

/// Write `text` to a temporary file that lives as long as the returned handle.
fn stage_text(text: &str) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("rebox-")
        .tempfile()
        .context("creating temporary file")?;
    file.write_all(text.as_bytes())
        .context("writing temporary file")?;
    file.flush().context("writing temporary file")?;
    Ok(file)
}

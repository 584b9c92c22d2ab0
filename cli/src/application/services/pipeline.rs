//! Runs a [`PhasePlan`] strictly in order, stopping at the first failure.

use tracing::Instrument;

use crate::application::ports::{ExecContext, ProgressReporter};
use crate::application::services::stderr_tail;
use crate::domain::{ExecTarget, Phase, PhaseFailure, PhaseFailureCause, PhasePlan};

/// Longest command rendering shown in a progress line.
const MAX_COMMAND_DISPLAY: usize = 72;

/// Result of a fully successful pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSummary {
    pub completed: usize,
}

/// Run every phase of `plan`, each in the context its target names.
///
/// Phase `k` never starts unless phases `1..k` all succeeded.
///
/// # Errors
///
/// Returns the [`PhaseFailure`] of the first phase whose payload copy or
/// command fails. Later phases are not run.
pub async fn run(
    plan: &PhasePlan,
    host: &impl ExecContext,
    resource: &impl ExecContext,
    reporter: &impl ProgressReporter,
) -> Result<PipelineSummary, PhaseFailure> {
    let total = plan.len();
    for phase in plan.phases() {
        reporter.header(&format!("[{}/{total}] {}", phase.ordinal(), phase.name));
        let span = tracing::info_span!("phase", ordinal = phase.ordinal(), name = %phase.name);
        match phase.target {
            ExecTarget::Host => run_phase(phase, host, reporter).instrument(span).await?,
            ExecTarget::Resource => run_phase(phase, resource, reporter).instrument(span).await?,
        }
        reporter.success(&format!("{} done", phase.name));
    }
    Ok(PipelineSummary { completed: total })
}

async fn run_phase(
    phase: &Phase,
    ctx: &impl ExecContext,
    reporter: &impl ProgressReporter,
) -> Result<(), PhaseFailure> {
    if let Some(payload) = &phase.payload {
        let local = payload.local.display().to_string();
        reporter.step(&format!("copying {local} to {}", payload.remote));
        let push_failed = |detail: String| PhaseFailureCause::PushFailed {
            local: local.clone(),
            remote: payload.remote.clone(),
            detail,
        };
        let output = ctx
            .push(&payload.local, &payload.remote, payload.mode)
            .await
            .map_err(|e| failure(phase, push_failed(format!("{e:#}"))))?;
        if !output.status.success() {
            return Err(failure(phase, push_failed(stderr_tail(&output))));
        }
    }

    // Payload-only phase.
    if phase.command.is_empty() {
        return Ok(());
    }

    let args: Vec<&str> = phase.command.iter().map(String::as_str).collect();
    reporter.step(&format!("{}: {}", ctx.describe(), display_command(&args)));
    tracing::debug!(context = %ctx.describe(), command = ?args, "running phase command");
    let output = ctx
        .exec(&args)
        .await
        .map_err(|e| failure(phase, PhaseFailureCause::ExecFailed(format!("{e:#}"))))?;
    if !output.status.success() {
        return Err(failure(
            phase,
            PhaseFailureCause::NonZeroExit {
                code: output.status.code(),
                stderr: stderr_tail(&output),
            },
        ));
    }
    Ok(())
}

fn failure(phase: &Phase, cause: PhaseFailureCause) -> PhaseFailure {
    tracing::error!(ordinal = phase.ordinal(), name = %phase.name, %cause, "phase failed");
    PhaseFailure {
        ordinal: phase.ordinal(),
        name: phase.name.clone(),
        cause,
    }
}

fn display_command(args: &[&str]) -> String {
    let joined = args.join(" ");
    if joined.chars().count() <= MAX_COMMAND_DISPLAY {
        return joined;
    }
    let mut short: String = joined.chars().take(MAX_COMMAND_DISPLAY - 1).collect();
    short.push('…');
    short
}

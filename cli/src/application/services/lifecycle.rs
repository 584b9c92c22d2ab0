//! Resource lifecycle: status, destructive reconciliation, creation, and
//! waiting for the resource to come up.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::net::Ipv4Addr;
use std::process::Output;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{OperatorPrompt, ProgressReporter, ResourceHost};
use crate::application::services::stderr_tail;
use crate::domain::config::WaitConfig;
use crate::domain::resource::first_ipv4;
use crate::domain::{ProvisionError, ResourceId, ResourceSpec, ResourceStatus};

/// Query the current status of `id`.
///
/// A non-zero exit whose stderr says the resource does not exist maps to
/// [`ResourceStatus::Absent`]; any other non-zero exit maps to
/// [`ResourceStatus::Unknown`].
///
/// # Errors
///
/// Returns an error if the host tool cannot be invoked at all.
pub async fn status(host: &impl ResourceHost, id: ResourceId) -> Result<ResourceStatus> {
    let output = host
        .status(id)
        .await
        .with_context(|| format!("querying status of resource {id}"))?;
    let status = if output.status.success() {
        ResourceStatus::from_pct_output(&String::from_utf8_lossy(&output.stdout))
    } else if String::from_utf8_lossy(&output.stderr).contains("does not exist") {
        ResourceStatus::Absent
    } else {
        ResourceStatus::Unknown
    };
    tracing::debug!(resource = %id, %status, "queried resource status");
    Ok(status)
}

/// Status plus address, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceOverview {
    pub id: ResourceId,
    pub status: ResourceStatus,
    pub address: Option<Ipv4Addr>,
}

/// Current status of `id`, and its IPv4 address when running.
///
/// # Errors
///
/// Returns an error if the host tool cannot be invoked at all.
pub async fn overview(host: &impl ResourceHost, id: ResourceId) -> Result<ResourceOverview> {
    let status = status(host, id).await?;
    let address = if status == ResourceStatus::Running {
        probe_address(host, id).await
    } else {
        None
    };
    Ok(ResourceOverview {
        id,
        status,
        address,
    })
}

// ── Reconcile ────────────────────────────────────────────────────────────────

/// How to answer the destructive-rebuild question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePolicy {
    /// Ask the operator.
    #[default]
    Ask,
    AssumeYes,
    AssumeNo,
}

/// What reconciliation did with a pre-existing resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing existed under the id.
    Absent,
    /// The resource existed and was destroyed.
    Destroyed { previous: ResourceStatus },
    /// The operator declined; the resource is untouched.
    Declined { status: ResourceStatus },
}

/// Ensure nothing occupies `id`, destroying an existing resource only after
/// affirmative confirmation.
///
/// A dismissed or failed prompt counts as "no".
///
/// # Errors
///
/// Returns an error if status cannot be queried or the stop/destroy fails.
pub async fn reconcile(
    host: &impl ResourceHost,
    prompt: &impl OperatorPrompt,
    reporter: &impl ProgressReporter,
    id: ResourceId,
    policy: ReconcilePolicy,
) -> Result<ReconcileOutcome> {
    let current = status(host, id).await?;
    if !current.is_present() {
        reporter.info(&format!("resource {id} does not exist yet"));
        return Ok(ReconcileOutcome::Absent);
    }

    reporter.warn(&format!("resource {id} already exists ({current})"));
    let confirmed = match policy {
        ReconcilePolicy::AssumeYes => true,
        ReconcilePolicy::AssumeNo => false,
        ReconcilePolicy::Ask => ask(prompt, reporter, id),
    };
    if !confirmed {
        tracing::info!(resource = %id, "rebuild declined");
        return Ok(ReconcileOutcome::Declined { status: current });
    }

    if current == ResourceStatus::Running {
        reporter.step(&format!("stopping resource {id}"));
        let output = host.stop(id).await.map_err(|e| mutation("stop", id, &e))?;
        ensure_success(&output, "stop", id)?;
    }
    reporter.step(&format!("destroying resource {id}"));
    let output = host
        .destroy(id)
        .await
        .map_err(|e| mutation("destroy", id, &e))?;
    ensure_success(&output, "destroy", id)?;
    reporter.success(&format!("resource {id} destroyed"));
    Ok(ReconcileOutcome::Destroyed { previous: current })
}

fn ask(prompt: &impl OperatorPrompt, reporter: &impl ProgressReporter, id: ResourceId) -> bool {
    let question = format!("Destroy resource {id} and everything in it, then rebuild?");
    match prompt.confirm(&question) {
        Ok(Some(answer)) => answer,
        Ok(None) => false,
        Err(e) => {
            reporter.warn(&format!("no confirmation available ({e}); treating as no"));
            false
        }
    }
}

// ── Create ───────────────────────────────────────────────────────────────────

/// Declare the resource, add passthrough lines to its raw config, and start it.
///
/// Raw config lines already present (as substrings) are not appended again.
///
/// # Errors
///
/// Returns [`ProvisionError::Mutation`] if any host step fails.
pub async fn create(
    host: &impl ResourceHost,
    reporter: &impl ProgressReporter,
    id: ResourceId,
    spec: &ResourceSpec,
) -> Result<()> {
    reporter.step(&format!("declaring resource {id} ({})", spec.hostname));
    let output = host
        .create(id, spec)
        .await
        .map_err(|e| mutation("create", id, &e))?;
    ensure_success(&output, "create", id)?;

    let lines = spec.passthrough_lines();
    if !lines.is_empty() {
        reporter.step("enabling device passthrough");
        let mut raw = host
            .raw_config(id)
            .await
            .map_err(|e| mutation("configure", id, &e))?;
        for line in lines {
            if raw.contains(line) {
                tracing::debug!(resource = %id, line, "raw config line already present");
                continue;
            }
            host.append_raw_config(id, line)
                .await
                .map_err(|e| mutation("configure", id, &e))?;
            raw.push_str(line);
            raw.push('\n');
        }
    }

    reporter.step(&format!("starting resource {id}"));
    let output = host
        .start(id)
        .await
        .map_err(|e| mutation("start", id, &e))?;
    ensure_success(&output, "start", id)?;
    reporter.success(&format!("resource {id} created"));
    Ok(())
}

// ── Await ready ──────────────────────────────────────────────────────────────

/// Bounds on [`await_ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyTiming {
    pub boot_timeout: Duration,
    pub address_timeout: Duration,
    pub poll_interval: Duration,
}

impl From<&WaitConfig> for ReadyTiming {
    fn from(wait: &WaitConfig) -> Self {
        Self {
            boot_timeout: Duration::from_secs(wait.boot_timeout_secs),
            address_timeout: Duration::from_secs(wait.address_timeout_secs),
            poll_interval: Duration::from_millis(wait.poll_interval_ms),
        }
    }
}

/// How far the resource got within the wait bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Ready { address: Ipv4Addr },
    /// Running, but no IPv4 address appeared in time.
    NoAddress,
    /// Never reached running.
    NotRunning { last: ResourceStatus },
}

/// Poll until the resource runs and reports an IPv4 address.
///
/// A missing address is reported as a warning; it is up to the caller whether
/// [`ReadyState::NotRunning`] is fatal.
///
/// # Errors
///
/// Returns an error if the status query itself cannot be invoked.
pub async fn await_ready(
    host: &impl ResourceHost,
    reporter: &impl ProgressReporter,
    id: ResourceId,
    timing: ReadyTiming,
) -> Result<ReadyState> {
    reporter.step(&format!("waiting for resource {id} to boot"));
    let deadline = Instant::now() + timing.boot_timeout;
    loop {
        let current = status(host, id).await?;
        if current == ResourceStatus::Running {
            break;
        }
        if Instant::now() >= deadline {
            reporter.warn(&format!(
                "resource {id} still {current} after {}s",
                timing.boot_timeout.as_secs()
            ));
            return Ok(ReadyState::NotRunning { last: current });
        }
        tokio::time::sleep(timing.poll_interval).await;
    }

    reporter.step("waiting for a network address");
    let deadline = Instant::now() + timing.address_timeout;
    loop {
        if let Some(address) = probe_address(host, id).await {
            reporter.success(&format!("resource {id} is up at {address}"));
            return Ok(ReadyState::Ready { address });
        }
        if Instant::now() >= deadline {
            reporter.warn(&format!(
                "no network address after {}s; continuing without one",
                timing.address_timeout.as_secs()
            ));
            return Ok(ReadyState::NoAddress);
        }
        tokio::time::sleep(timing.poll_interval).await;
    }
}

async fn probe_address(host: &impl ResourceHost, id: ResourceId) -> Option<Ipv4Addr> {
    match host.exec(id, &["hostname", "-I"]).await {
        Ok(output) if output.status.success() => {
            first_ipv4(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            tracing::debug!(resource = %id, stderr = %stderr_tail(&output), "address probe failed");
            None
        }
        Err(e) => {
            tracing::debug!(resource = %id, error = %e, "address probe failed");
            None
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn mutation(action: &'static str, id: ResourceId, err: &anyhow::Error) -> ProvisionError {
    ProvisionError::Mutation {
        action,
        id,
        detail: format!("{err:#}"),
    }
}

fn ensure_success(output: &Output, action: &'static str, id: ResourceId) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let tail = stderr_tail(output);
    let detail = if tail.is_empty() {
        format!("exit status {}", output.status.code().unwrap_or(-1))
    } else {
        tail
    };
    Err(ProvisionError::Mutation { action, id, detail }.into())
}

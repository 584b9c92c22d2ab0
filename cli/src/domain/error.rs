//! Typed domain error enums.
//!
//! Fatal failures of a rebuild are modelled here. Advisory outcomes
//! (verification results, a missing network address) are plain data types and
//! never appear in these enums. All error types implement `thiserror::Error`
//! and convert to `anyhow::Error` via the `?` operator.

use thiserror::Error;

use crate::domain::resource::ResourceId;

// ── Rebuild errors ───────────────────────────────────────────────────────────

/// Fatal errors that abort a rebuild.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A mutation precondition failed; nothing has been changed yet.
    #[error("preflight failed: {0}")]
    Precondition(String),

    /// Creating, starting, or destroying the resource failed. The host may be
    /// in an intermediate state and needs manual inspection.
    #[error("{action} of resource {id} failed: {detail}")]
    Mutation {
        action: &'static str,
        id: ResourceId,
        detail: String,
    },

    #[error(transparent)]
    Phase(#[from] PhaseFailure),
}

/// A phase in the pipeline failed. Later phases were not run.
#[derive(Debug, Error)]
#[error("phase {ordinal} '{name}' failed: {cause}")]
pub struct PhaseFailure {
    pub ordinal: usize,
    pub name: String,
    pub cause: PhaseFailureCause,
}

/// Why a phase failed.
#[derive(Debug, Error)]
pub enum PhaseFailureCause {
    #[error("could not copy payload {local} to {remote}: {detail}")]
    PushFailed {
        local: String,
        remote: String,
        detail: String,
    },

    #[error("could not run command: {0}")]
    ExecFailed(String),

    #[error("command exited with {}{}", exit_label(.code), stderr_suffix(.stderr))]
    NonZeroExit { code: Option<i32>, stderr: String },
}

#[allow(clippy::ref_option)]
fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| format!("code {c}"))
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors raised while validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid resource id {0}: must be between 100 and 999999999")]
    InvalidResourceId(u32),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

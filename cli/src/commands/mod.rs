//! Command implementations

pub mod client_setup;
pub mod rebuild;
pub mod status;
pub mod verify;

use crate::domain::{ConfigError, ProvisionError};

/// Stable machine-readable code for a failed command, used in `--json` error
/// objects.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<ProvisionError>() {
        return match e {
            ProvisionError::Precondition(_) => "precondition_failed",
            ProvisionError::Mutation { .. } => "resource_mutation_failed",
            ProvisionError::Phase(_) => "phase_failed",
        };
    }
    if err.chain().any(|c| c.downcast_ref::<ConfigError>().is_some()) {
        return "invalid_config";
    }
    "error"
}

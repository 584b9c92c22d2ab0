//! Domain layer: pure types, validation, and plan construction.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`
//! sockets. All functions are synchronous and take data in, returning data out.

pub mod block;
pub mod config;
pub mod error;
pub mod phase;
pub mod recipe;
pub mod resource;
pub mod verification;

pub use block::{ConfigBlock, InstallOutcome};
pub use config::SandboxConfig;
pub use error::{ConfigError, PhaseFailure, PhaseFailureCause, ProvisionError};
pub use phase::{ExecTarget, Payload, Phase, PhaseDraft, PhasePlan};
pub use resource::{ResourceId, ResourceSpec, ResourceStatus};
pub use verification::{CheckResult, Probe, VerificationCheck, VerificationReport};

//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{ConfigBlock, InstallOutcome, ResourceId, ResourceSpec};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Host Resource Port ───────────────────────────────────────────────────────

/// The virtualization host's resource-management interface.
///
/// Every operation takes the resource id explicitly; implementations hold no
/// notion of a "current" resource. Methods return the raw process output and
/// leave interpretation to the application services, except for the raw
/// config helpers which deal in file content.
#[allow(async_fn_in_trait)]
pub trait ResourceHost {
    /// Query the resource status.
    async fn status(&self, id: ResourceId) -> Result<Output>;
    /// Declare a new, stopped resource.
    async fn create(&self, id: ResourceId, spec: &ResourceSpec) -> Result<Output>;
    async fn start(&self, id: ResourceId) -> Result<Output>;
    async fn stop(&self, id: ResourceId) -> Result<Output>;
    /// Remove the resource and its volumes.
    async fn destroy(&self, id: ResourceId) -> Result<Output>;
    /// Run a command inside the resource.
    async fn exec(&self, id: ResourceId, args: &[&str]) -> Result<Output>;
    /// Copy a local file into the resource with the given mode.
    async fn push(&self, id: ResourceId, local: &Path, remote: &str, mode: u32) -> Result<Output>;
    /// Read the host-side low-level configuration of the resource.
    async fn raw_config(&self, id: ResourceId) -> Result<String>;
    /// Append one line to the host-side low-level configuration.
    async fn append_raw_config(&self, id: ResourceId, line: &str) -> Result<()>;
}

// ── Execution Context Port ───────────────────────────────────────────────────

/// "Run a command" / "copy a file" against one execution context: the local
/// host or a specific resource.
#[allow(async_fn_in_trait)]
pub trait ExecContext {
    /// Human-readable context name for logs and error messages.
    fn describe(&self) -> String;
    /// Execute a command and capture its output.
    async fn exec(&self, args: &[&str]) -> Result<Output>;
    /// Copy a local file to `remote` inside the context and apply `mode`.
    async fn push(&self, local: &Path, remote: &str, mode: u32) -> Result<Output>;
}

// ── Operator Prompt Port ─────────────────────────────────────────────────────

/// Interactive confirmation for destructive actions.
#[cfg_attr(test, mockall::automock)]
pub trait OperatorPrompt {
    /// Ask a yes/no question. `Ok(None)` means the operator gave no answer
    /// (dismissed the prompt); callers must treat it as "no".
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    fn confirm(&self, prompt: &str) -> Result<Option<bool>>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit a section header.
    fn header(&self, message: &str);
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Emit a non-fatal failure line.
    fn error(&self, message: &str);
    /// Emit a neutral informational message.
    fn info(&self, message: &str);
}

// ── Text Block Port ──────────────────────────────────────────────────────────

/// Idempotent installation of marker-delimited blocks into local files.
pub trait BlockInstaller {
    /// Whether `path` exists and contains `start_marker` on some line.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    fn is_installed(&self, path: &Path, start_marker: &str) -> Result<bool>;

    /// Install `block` unless its start marker is already present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup, append, or permission change fails.
    fn install(&self, block: &ConfigBlock) -> Result<InstallOutcome>;
}

//! Proxmox VE implementation of the `ResourceHost` port.
//!
//! `PctHost<R>` routes every container operation through the `pct` CLI via a
//! `CommandRunner`, and edits the raw container config under
//! `/etc/pve/lxc/` directly for device passthrough lines.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;

use crate::application::ports::{CommandRunner, ResourceHost};
use crate::domain::{ResourceId, ResourceSpec};
use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, DEFAULT_EXEC_TIMEOUT, TokioCommandRunner};

const PCT: &str = "pct";

/// Where Proxmox keeps container configs on a cluster node.
pub const DEFAULT_CONFIG_DIR: &str = "/etc/pve/lxc";

/// `pct create` unpacks the template and allocates the volume.
const CREATE_TIMEOUT: Duration = Duration::from_secs(900);

/// Infrastructure adapter over the `pct` CLI.
///
/// Generic over `R: CommandRunner` so that tests can inject a recording
/// runner without spawning real processes.
pub struct PctHost<R: CommandRunner> {
    cmd_runner: R,
    exec_runner: R,
    config_dir: PathBuf,
}

impl<R: CommandRunner> PctHost<R> {
    pub fn new(cmd_runner: R, exec_runner: R) -> Self {
        Self {
            cmd_runner,
            exec_runner,
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
        }
    }

    /// Read and append raw configs under `dir` instead of `/etc/pve/lxc`.
    #[must_use]
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    fn config_path(&self, id: ResourceId) -> PathBuf {
        self.config_dir.join(format!("{id}.conf"))
    }
}

impl PctHost<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn default_runner() -> Self {
        Self::new(
            TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT),
            TokioCommandRunner::new(DEFAULT_EXEC_TIMEOUT),
        )
    }
}

impl<R: CommandRunner> ResourceHost for PctHost<R> {
    async fn status(&self, id: ResourceId) -> Result<Output> {
        let id = id.to_string();
        self.cmd_runner
            .run(PCT, &["status", &id])
            .await
            .context("pct status")
    }

    async fn create(&self, id: ResourceId, spec: &ResourceSpec) -> Result<Output> {
        let args = spec.create_args(id);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.cmd_runner
            .run_with_timeout(PCT, &args, CREATE_TIMEOUT)
            .await
            .context("pct create")
    }

    async fn start(&self, id: ResourceId) -> Result<Output> {
        let id = id.to_string();
        self.cmd_runner
            .run(PCT, &["start", &id])
            .await
            .context("pct start")
    }

    async fn stop(&self, id: ResourceId) -> Result<Output> {
        let id = id.to_string();
        self.cmd_runner
            .run(PCT, &["stop", &id])
            .await
            .context("pct stop")
    }

    async fn destroy(&self, id: ResourceId) -> Result<Output> {
        let id = id.to_string();
        self.cmd_runner
            .run(PCT, &["destroy", &id, "--purge"])
            .await
            .context("pct destroy")
    }

    async fn exec(&self, id: ResourceId, args: &[&str]) -> Result<Output> {
        let id = id.to_string();
        let mut full = vec!["exec", id.as_str(), "--"];
        full.extend_from_slice(args);
        self.exec_runner
            .run(PCT, &full)
            .await
            .context("pct exec")
    }

    async fn push(&self, id: ResourceId, local: &Path, remote: &str, mode: u32) -> Result<Output> {
        let id = id.to_string();
        let local = local
            .to_str()
            .with_context(|| format!("non-UTF-8 path: {}", local.display()))?;
        let perms = format!("{mode:o}");
        self.cmd_runner
            .run(PCT, &["push", &id, local, remote, "--perms", &perms])
            .await
            .context("pct push")
    }

    async fn raw_config(&self, id: ResourceId) -> Result<String> {
        let path = self.config_path(id);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))
    }

    async fn append_raw_config(&self, id: ResourceId, line: &str) -> Result<()> {
        let path = self.config_path(id);
        let existing = self.raw_config(id).await?;
        let mut text = String::new();
        if !existing.is_empty() && !existing.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(line);
        text.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("cannot open {}", path.display()))?;
        file.write_all(text.as_bytes())
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;
        tracing::debug!(resource = %id, line, path = %path.display(), "appended raw config line");
        Ok(())
    }
}

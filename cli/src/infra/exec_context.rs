//! `ExecContext` for the hypervisor host itself.

use std::path::Path;
use std::process::Output;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, ExecContext};
use crate::infra::command_runner::{DEFAULT_EXEC_TIMEOUT, TokioCommandRunner};

/// Runs commands on the local host. Copies go through `install(1)` so the
/// destination mode is applied in the same step.
pub struct HostContext<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> HostContext<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl HostContext<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn default_runner() -> Self {
        Self::new(TokioCommandRunner::new(DEFAULT_EXEC_TIMEOUT))
    }
}

impl<R: CommandRunner> ExecContext for HostContext<R> {
    fn describe(&self) -> String {
        "host".to_string()
    }

    async fn exec(&self, args: &[&str]) -> Result<Output> {
        let (program, rest) = args.split_first().context("empty command")?;
        self.runner.run(program, rest).await
    }

    async fn push(&self, local: &Path, remote: &str, mode: u32) -> Result<Output> {
        let local = local
            .to_str()
            .with_context(|| format!("non-UTF-8 path: {}", local.display()))?;
        let mode = format!("{mode:o}");
        self.runner
            .run("install", &["-D", "-m", &mode, local, remote])
            .await
            .context("install")
    }
}

//! Application context: unified state passed to every command handler.
//!
//! `AppContext` carries output settings, the confirmation policy, and where
//! to find the configuration. Adding a cross-cutting concern requires only
//! one field change here; command signatures stay the same.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::services::lifecycle::ReconcilePolicy;
use crate::infra::config::{LoadedConfig, YamlConfigStore};
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Answer "yes" to the destructive rebuild confirmation.
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    pub output: OutputFlags,
    pub behaviour: BehaviourFlags,
    /// Explicit config file (`--config` / `REBOX_CONFIG`).
    pub config: Option<PathBuf>,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context. Always quiet in JSON mode so stdout carries
    /// only the JSON document.
    pub output: OutputContext,
    pub mode: OutputMode,
    /// How the destructive rebuild question is answered.
    ///
    /// `--yes` gives `AssumeYes`. Without it, a `CI` environment gives
    /// `AssumeNo`; otherwise the operator is asked.
    pub policy: ReconcilePolicy,
    config_path: Option<PathBuf>,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: AppFlags) -> Self {
        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        let policy = if flags.behaviour.yes {
            ReconcilePolicy::AssumeYes
        } else if std::env::var_os("CI").is_some() {
            ReconcilePolicy::AssumeNo
        } else {
            ReconcilePolicy::Ask
        };

        Self {
            output: OutputContext::new(
                flags.output.no_color,
                flags.output.quiet || flags.output.json,
            ),
            mode,
            policy,
            config_path: flags.config,
        }
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Load and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load_config(&self) -> Result<LoadedConfig> {
        let loaded = YamlConfigStore::new(self.config_path.clone())?.load()?;
        if !loaded.from_file {
            self.output.info(&format!(
                "No config at {}; using defaults",
                loaded.path.display()
            ));
        }
        Ok(loaded)
    }
}

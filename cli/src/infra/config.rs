//! YAML configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::SandboxConfig;

const CONFIG_DIR: &str = ".rebox";
const CONFIG_FILE: &str = "config.yaml";

/// A validated configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SandboxConfig,
    /// The file that was read, or would have been read if it existed.
    pub path: PathBuf,
    pub from_file: bool,
    /// `provision.payload_dir` resolved against the config file's directory.
    pub payload_dir: PathBuf,
}

/// Reads `SandboxConfig` from a YAML file on disk.
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    /// Store at `explicit` (from `--config` / `REBOX_CONFIG`), else
    /// `~/.rebox/config.yaml`.
    ///
    /// # Errors
    ///
    /// Returns an error if no path was given and the home directory cannot be
    /// determined.
    pub fn new(explicit: Option<PathBuf>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path,
            None => dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?
                .join(CONFIG_DIR)
                .join(CONFIG_FILE),
        };
        Ok(Self::with_path(path))
    }

    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load and validate. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails
    /// validation.
    pub fn load(&self) -> Result<LoadedConfig> {
        let from_file = self.path.exists();
        let config = if from_file {
            let content = std::fs::read_to_string(&self.path)
                .with_context(|| format!("cannot read {}", self.path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("cannot parse {}", self.path.display()))?
        } else {
            tracing::debug!(path = %self.path.display(), "no config file; using defaults");
            SandboxConfig::default()
        };
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", self.path.display()))?;

        let payload_dir = resolve(self.base_dir(), &config.provision.payload_dir);
        Ok(LoadedConfig {
            config,
            path: self.path.clone(),
            from_file,
            payload_dir,
        })
    }

    fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

fn resolve(base: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        base.join(dir)
    }
}

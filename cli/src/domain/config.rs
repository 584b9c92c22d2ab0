//! Configuration schema and validation.
//!
//! Pure functions only, no I/O.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::phase::ExecTarget;
use crate::domain::resource::{Feature, Passthrough, ResourceId, ResourceSpec};

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.rebox/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SandboxConfig {
    pub resource: ResourceConfig,
    pub provision: ProvisionConfig,
    pub service: ServiceConfig,
    pub clone: CloneConfig,
    pub verify: VerifyConfig,
    pub client: ClientConfig,
    pub wait: WaitConfig,
    pub preflight: PreflightConfig,
    /// Extra follow-ups printed after a successful rebuild.
    pub manual_steps: Vec<String>,
}

/// Sandbox container attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResourceConfig {
    pub id: ResourceId,
    pub hostname: String,
    pub template: String,
    pub storage: String,
    pub cores: u32,
    pub memory_mb: u32,
    pub swap_mb: u32,
    pub disk_gb: u32,
    pub bridge: String,
    pub features: Vec<Feature>,
    pub onboot: bool,
    pub unprivileged: bool,
    pub passthrough: Vec<Passthrough>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            id: ResourceId::default(),
            hostname: "sandbox".to_string(),
            template: "local:vztmpl/debian-12-standard_12.7-1_amd64.tar.zst".to_string(),
            storage: "local-lvm".to_string(),
            cores: 4,
            memory_mb: 8192,
            swap_mb: 512,
            disk_gb: 32,
            bridge: "vmbr0".to_string(),
            features: vec![Feature::Nesting, Feature::Keyctl],
            onboot: true,
            unprivileged: true,
            passthrough: vec![Passthrough::Tun],
        }
    }
}

impl ResourceConfig {
    #[must_use]
    pub fn spec(&self) -> ResourceSpec {
        ResourceSpec {
            hostname: self.hostname.clone(),
            template: self.template.clone(),
            storage: self.storage.clone(),
            cores: self.cores,
            memory_mb: self.memory_mb,
            swap_mb: self.swap_mb,
            disk_gb: self.disk_gb,
            bridge: self.bridge.clone(),
            features: self.features.clone(),
            onboot: self.onboot,
            unprivileged: self.unprivileged,
            passthrough: self.passthrough.clone(),
        }
    }
}

/// Provisioning phases and where their payloads live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Local directory holding phase scripts. Relative paths resolve against
    /// the config file's directory.
    pub payload_dir: PathBuf,
    /// Directory inside the resource that scripts are pushed to.
    pub remote_dir: String,
    /// Unprivileged account that owns the service and cloned state.
    pub user: String,
    pub phases: Vec<PhaseConfig>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            payload_dir: PathBuf::from("provision"),
            remote_dir: "/root/rebox".to_string(),
            user: "dev".to_string(),
            phases: vec![
                PhaseConfig::script("system packages", "10-packages.sh"),
                PhaseConfig::script("user account", "20-user.sh"),
                PhaseConfig::script("service runtime", "30-runtime.sh"),
                PhaseConfig::script("multiplexer config", "40-multiplexer.sh"),
            ],
        }
    }
}

/// One configured phase: either a script pushed and run with `bash`, or a
/// bare command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub target: ExecTarget,
}

impl PhaseConfig {
    fn script(name: &str, script: &str) -> Self {
        Self {
            name: name.to_string(),
            script: Some(script.to_string()),
            command: None,
            target: ExecTarget::Resource,
        }
    }
}

/// The long-running interactive service kept alive inside a multiplexer
/// session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    /// systemd unit name without the `.service` suffix.
    pub name: String,
    /// Multiplexer session name.
    pub session: String,
    /// Command started inside the session.
    pub command: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "rebox-session".to_string(),
            session: "main".to_string(),
            command: "bash -l".to_string(),
        }
    }
}

/// External state cloned into the resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CloneConfig {
    /// Git URL. The clone stage is skipped when unset.
    pub repository: Option<String>,
    pub branch: Option<String>,
    /// Destination inside the resource; `~/` expands to the service user's home.
    pub dest: String,
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            repository: None,
            branch: None,
            dest: "~/workspace".to_string(),
        }
    }
}

/// A user-defined verification command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtraCheck {
    pub name: String,
    pub command: Vec<String>,
}

/// Post-build checklist inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VerifyConfig {
    /// Command proving the service runtime is installed.
    pub runtime: Vec<String>,
    /// Tools that must be on the resource's `PATH`.
    pub tools: Vec<String>,
    /// Files that must exist; `~/` expands to the service user's home.
    pub files: Vec<String>,
    /// Host pinged from inside the resource. `None` skips the check.
    pub ping: Option<String>,
    pub extra: Vec<ExtraCheck>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            runtime: vec!["node".to_string(), "--version".to_string()],
            tools: vec!["git".to_string(), "tmux".to_string(), "tailscale".to_string()],
            files: vec!["~/.tmux.conf".to_string()],
            ping: Some("1.1.1.1".to_string()),
            extra: Vec::new(),
        }
    }
}

/// Workstation-side connection settings used by `rebox client-setup`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// SSH host alias, also used as the shell alias name.
    pub alias: String,
    /// Address or mesh hostname of the sandbox. Defaults to the resource hostname.
    pub host: Option<String>,
    pub identity_file: Option<String>,
    /// Shell profile relative to `$HOME`.
    pub shell_profile: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            alias: "sandbox".to_string(),
            host: None,
            identity_file: None,
            shell_profile: ".bashrc".to_string(),
        }
    }
}

/// Boot wait tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WaitConfig {
    pub boot_timeout_secs: u64,
    pub address_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            boot_timeout_secs: 120,
            address_timeout_secs: 60,
            poll_interval_ms: 2000,
        }
    }
}

/// Checks run before any mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PreflightConfig {
    pub required_tools: Vec<String>,
    /// Host pinged from the hypervisor. `None` skips the reachability check.
    pub reachability_host: Option<String>,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            required_tools: vec!["pct".to_string()],
            reachability_host: Some("1.1.1.1".to_string()),
        }
    }
}

// ── Derived values ───────────────────────────────────────────────────────────

impl SandboxConfig {
    /// Home directory of the service user inside the resource.
    #[must_use]
    pub fn user_home(&self) -> String {
        if self.provision.user == "root" {
            "/root".to_string()
        } else {
            format!("/home/{}", self.provision.user)
        }
    }

    /// Expands a leading `~/` to [`Self::user_home`].
    #[must_use]
    pub fn expand_home(&self, path: &str) -> String {
        match path.strip_prefix("~/") {
            Some(rest) => format!("{}/{rest}", self.user_home()),
            None if path == "~" => self.user_home(),
            None => path.to_string(),
        }
    }

    /// Host name clients use to reach the sandbox.
    #[must_use]
    pub fn client_host(&self) -> &str {
        self.client
            .host
            .as_deref()
            .unwrap_or(&self.resource.hostname)
    }

    /// Validates values serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.resource;
        validate_name("resource.hostname", &r.hostname, |c| {
            c.is_ascii_alphanumeric() || c == '-'
        })?;
        require_non_empty("resource.template", &r.template)?;
        require_non_empty("resource.storage", &r.storage)?;
        require_non_empty("resource.bridge", &r.bridge)?;
        require_positive("resource.cores", r.cores)?;
        require_positive("resource.memory_mb", r.memory_mb)?;
        require_positive("resource.disk_gb", r.disk_gb)?;

        validate_name("provision.user", &self.provision.user, |c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'
        })?;
        for (i, phase) in self.provision.phases.iter().enumerate() {
            let key = format!("provision.phases[{i}]");
            if phase.name.trim().is_empty() {
                return Err(invalid(&key, "name must not be empty"));
            }
            match (&phase.script, &phase.command) {
                (Some(_), Some(_)) => {
                    return Err(invalid(&key, "set either script or command, not both"));
                }
                (None, None) => return Err(invalid(&key, "needs a script or a command")),
                (None, Some(cmd)) if cmd.is_empty() => {
                    return Err(invalid(&key, "command must not be empty"));
                }
                _ => {}
            }
        }

        validate_name("service.name", &self.service.name, |c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@')
        })?;
        validate_name("service.session", &self.service.session, |c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_')
        })?;
        require_non_empty("service.command", &self.service.command)?;
        require_non_empty("clone.dest", &self.clone.dest)?;

        validate_name("client.alias", &self.client.alias, |c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
        })?;
        require_non_empty("client.shell_profile", &self.client.shell_profile)?;

        for (i, extra) in self.verify.extra.iter().enumerate() {
            let key = format!("verify.extra[{i}]");
            if extra.name.trim().is_empty() {
                return Err(invalid(&key, "name must not be empty"));
            }
            if extra.command.is_empty() {
                return Err(invalid(&key, "command must not be empty"));
            }
        }

        if self.wait.poll_interval_ms == 0 {
            return Err(invalid("wait.poll_interval_ms", "must be greater than 0"));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn require_non_empty(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(key, "must not be empty"));
    }
    Ok(())
}

fn require_positive(key: &str, value: u32) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(invalid(key, "must be greater than 0"));
    }
    Ok(())
}

fn validate_name(key: &str, value: &str, allowed: impl Fn(char) -> bool) -> Result<(), ConfigError> {
    require_non_empty(key, value)?;
    if let Some(bad) = value.chars().find(|c| !allowed(*c)) {
        return Err(invalid(key, &format!("character {bad:?} is not allowed")));
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────

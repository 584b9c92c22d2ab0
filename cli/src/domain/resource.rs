//! Sandbox resource identity, status, and creation attributes.
//!
//! Pure types only. Translating these into `pct` arguments happens here as
//! data-in/data-out functions so the host adapter stays a thin shell.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

/// Lowest container id Proxmox accepts.
pub const MIN_RESOURCE_ID: u32 = 100;
/// Highest container id Proxmox accepts.
pub const MAX_RESOURCE_ID: u32 = 999_999_999;

// ── Identity ─────────────────────────────────────────────────────────────────

/// Numeric container id, unique within the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ResourceId(u32);

impl ResourceId {
    /// Validates and wraps a raw container id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidResourceId`] outside `100..=999999999`.
    pub fn new(raw: u32) -> Result<Self, ConfigError> {
        if (MIN_RESOURCE_ID..=MAX_RESOURCE_ID).contains(&raw) {
            Ok(Self(raw))
        } else {
            Err(ConfigError::InvalidResourceId(raw))
        }
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self(200)
    }
}

impl TryFrom<u32> for ResourceId {
    type Error = ConfigError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<ResourceId> for u32 {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Status ───────────────────────────────────────────────────────────────────

/// Observed resource state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Absent,
    Stopped,
    Running,
    Unknown,
}

impl ResourceStatus {
    /// Whether the host knows about the resource at all.
    #[must_use]
    pub fn is_present(self) -> bool {
        self != Self::Absent
    }

    /// Parses the stdout of `pct status <id>` (`status: running`).
    #[must_use]
    pub fn from_pct_output(stdout: &str) -> Self {
        let value = stdout
            .lines()
            .find_map(|l| l.trim().strip_prefix("status:"))
            .map(str::trim);
        match value {
            Some("running") => Self::Running,
            Some("stopped") => Self::Stopped,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Absent => "absent",
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// ── Attributes ───────────────────────────────────────────────────────────────

/// Container capability tokens passed through `--features`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    /// Nested containers / namespaces inside the sandbox.
    Nesting,
    /// Kernel keyring access (needed by systemd and some credential helpers).
    Keyctl,
    Fuse,
    Mknod,
}

impl Feature {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nesting => "nesting",
            Self::Keyctl => "keyctl",
            Self::Fuse => "fuse",
            Self::Mknod => "mknod",
        }
    }
}

/// Host devices bound into the container through raw LXC config lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Passthrough {
    /// `/dev/net/tun`, required by mesh VPN clients.
    Tun,
    /// `/dev/fuse`.
    Fuse,
}

impl Passthrough {
    /// Raw `/etc/pve/lxc/<id>.conf` lines for this device.
    #[must_use]
    pub fn config_lines(self) -> &'static [&'static str] {
        match self {
            Self::Tun => &[
                "lxc.cgroup2.devices.allow: c 10:200 rwm",
                "lxc.mount.entry: /dev/net/tun dev/net/tun none bind,create=file",
            ],
            Self::Fuse => &[
                "lxc.cgroup2.devices.allow: c 10:229 rwm",
                "lxc.mount.entry: /dev/fuse dev/fuse none bind,create=file",
            ],
        }
    }
}

/// Everything needed to declare a new container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    pub hostname: String,
    /// Volume id of the OS template, e.g. `local:vztmpl/debian-12-standard_12.7-1_amd64.tar.zst`.
    pub template: String,
    /// Storage backing the root filesystem.
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

impl ResourceSpec {
    /// Arguments for `pct create <id> ...`. The resource is always declared
    /// stopped; starting it is a separate step.
    #[must_use]
    pub fn create_args(&self, id: ResourceId) -> Vec<String> {
        let mut args = vec![
            "create".to_string(),
            id.to_string(),
            self.template.clone(),
            "--hostname".to_string(),
            self.hostname.clone(),
            "--cores".to_string(),
            self.cores.to_string(),
            "--memory".to_string(),
            self.memory_mb.to_string(),
            "--swap".to_string(),
            self.swap_mb.to_string(),
            "--rootfs".to_string(),
            format!("{}:{}", self.storage, self.disk_gb),
            "--net0".to_string(),
            format!("name=eth0,bridge={},ip=dhcp", self.bridge),
            "--onboot".to_string(),
            u8::from(self.onboot).to_string(),
            "--unprivileged".to_string(),
            u8::from(self.unprivileged).to_string(),
        ];
        if let Some(features) = self.features_arg() {
            args.push("--features".to_string());
            args.push(features);
        }
        args.push("--start".to_string());
        args.push("0".to_string());
        args
    }

    /// `nesting=1,keyctl=1` style feature string, `None` when no features.
    #[must_use]
    pub fn features_arg(&self) -> Option<String> {
        if self.features.is_empty() {
            return None;
        }
        let mut features = self.features.clone();
        features.sort();
        features.dedup();
        Some(
            features
                .iter()
                .map(|f| format!("{}=1", f.as_str()))
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    /// Raw config lines required by the passthrough devices, deduplicated
    /// and in declaration order.
    #[must_use]
    pub fn passthrough_lines(&self) -> Vec<&'static str> {
        let mut lines: Vec<&'static str> = Vec::new();
        for device in &self.passthrough {
            for line in device.config_lines() {
                if !lines.contains(line) {
                    lines.push(line);
                }
            }
        }
        lines
    }
}

/// First IPv4 address in `hostname -I` output.
#[must_use]
pub fn first_ipv4(stdout: &str) -> Option<std::net::Ipv4Addr> {
    stdout
        .split_whitespace()
        .find_map(|tok| tok.parse::<std::net::Ipv4Addr>().ok())
}

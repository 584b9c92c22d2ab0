//! Verification checks and their results.
//!
//! A failing check is data, not an error: nothing in this module can abort
//! a run.

use std::borrow::Cow;

use serde::Serialize;

/// What a check executes inside the resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Passes when the command exits 0.
    Command(Vec<String>),
    FileExists(String),
    DirExists(String),
    /// Passes when `name` resolves on the resource's `PATH`.
    Tool(String),
    /// Passes when the systemd unit is active.
    ServiceActive(String),
}

impl Probe {
    /// Argument vector executed in the target context.
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        match self {
            Self::Command(argv) => argv.clone(),
            Self::FileExists(path) => vec!["test".into(), "-f".into(), path.clone()],
            Self::DirExists(path) => vec!["test".into(), "-d".into(), path.clone()],
            Self::Tool(name) => vec![
                "sh".into(),
                "-c".into(),
                format!(
                    "command -v {}",
                    shell_escape::unix::escape(Cow::Borrowed(name.as_str()))
                ),
            ],
            Self::ServiceActive(unit) => vec![
                "systemctl".into(),
                "is-active".into(),
                "--quiet".into(),
                unit.clone(),
            ],
        }
    }
}

/// An independent named probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCheck {
    pub name: String,
    pub probe: Probe,
}

impl VerificationCheck {
    pub fn new(name: impl Into<String>, probe: Probe) -> Self {
        Self {
            name: name.into(),
            probe,
        }
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// All results of one verification pass, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub results: Vec<CheckResult>,
}

impl VerificationReport {
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Names of failing checks.
    #[must_use]
    pub fn failures(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.name.as_str())
            .collect()
    }
}

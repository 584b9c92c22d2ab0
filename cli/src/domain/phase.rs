//! Phase descriptors and ordered phase plans.
//!
//! A [`PhasePlan`] is the only way to build an ordered sequence of phases:
//! ordinals are assigned on insertion, so run-time order always equals
//! declaration order.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where a phase runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecTarget {
    /// The machine running `rebox` (the virtualization host).
    Host,
    /// Inside the sandbox resource.
    #[default]
    Resource,
}

impl fmt::Display for ExecTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Resource => f.write_str("resource"),
        }
    }
}

/// A local file copied into the target context before the phase command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub local: PathBuf,
    pub remote: String,
    /// Octal file mode applied after the copy, e.g. `0o755` for scripts.
    pub mode: u32,
}

/// One unit of provisioning work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    ordinal: usize,
    pub name: String,
    pub target: ExecTarget,
    pub payload: Option<Payload>,
    pub command: Vec<String>,
}

impl Phase {
    /// 1-based position in its plan.
    #[must_use]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

/// Fields of a phase before it is placed in a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseDraft {
    pub name: String,
    pub target: ExecTarget,
    pub payload: Option<Payload>,
    pub command: Vec<String>,
}

impl PhaseDraft {
    /// A command-only phase.
    pub fn command<I, S>(name: impl Into<String>, target: ExecTarget, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            target,
            payload: None,
            command: command.into_iter().map(Into::into).collect(),
        }
    }

    /// A script phase: push `local` to `remote` as an executable and run it
    /// with `bash`.
    pub fn script(
        name: impl Into<String>,
        target: ExecTarget,
        local: impl Into<PathBuf>,
        remote: impl Into<String>,
    ) -> Self {
        let remote = remote.into();
        Self {
            name: name.into(),
            target,
            command: vec!["bash".to_string(), remote.clone()],
            payload: Some(Payload {
                local: local.into(),
                remote,
                mode: 0o755,
            }),
        }
    }

    /// Attach a payload to a command phase.
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Ordered, immutable list of phases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhasePlan {
    phases: Vec<Phase>,
}

impl PhasePlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a phase; it receives the next ordinal.
    #[must_use]
    pub fn then(mut self, draft: PhaseDraft) -> Self {
        self.push(draft);
        self
    }

    pub fn push(&mut self, draft: PhaseDraft) {
        let PhaseDraft {
            name,
            target,
            payload,
            command,
        } = draft;
        self.phases.push(Phase {
            ordinal: self.phases.len() + 1,
            name,
            target,
            payload,
            command,
        });
    }

    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Payloads referenced by the plan, in phase order.
    pub fn payloads(&self) -> impl Iterator<Item = (&Phase, &Payload)> {
        self.phases
            .iter()
            .filter_map(|p| p.payload.as_ref().map(|payload| (p, payload)))
    }
}

impl FromIterator<PhaseDraft> for PhasePlan {
    fn from_iter<T: IntoIterator<Item = PhaseDraft>>(iter: T) -> Self {
        let mut plan = Self::new();
        for draft in iter {
            plan.push(draft);
        }
        plan
    }
}

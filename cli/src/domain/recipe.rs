//! Turns a [`SandboxConfig`] into the concrete plans, checks, and blocks a
//! rebuild or client setup executes.
//!
//! Everything here is data-in/data-out so the orchestration services can be
//! tested against the exact phases a real run would produce.

use std::borrow::Cow;
use std::path::Path;

use crate::domain::block::ConfigBlock;
use crate::domain::config::SandboxConfig;
use crate::domain::phase::{ExecTarget, Payload, PhaseDraft, PhasePlan};
use crate::domain::verification::{Probe, VerificationCheck};

fn quote(s: &str) -> Cow<'_, str> {
    shell_escape::unix::escape(Cow::Borrowed(s))
}

// ── Provisioning ─────────────────────────────────────────────────────────────

/// Phases declared under `provision.phases`, preceded by a step creating the
/// remote payload directory when any script targets the resource.
#[must_use]
pub fn provision_plan(config: &SandboxConfig, payload_dir: &Path) -> PhasePlan {
    let provision = &config.provision;
    let mut plan = PhasePlan::new();

    let pushes_into_resource = provision
        .phases
        .iter()
        .any(|p| p.script.is_some() && p.target == ExecTarget::Resource);
    if pushes_into_resource {
        plan.push(PhaseDraft::command(
            "payload directory",
            ExecTarget::Resource,
            ["mkdir", "-p", provision.remote_dir.as_str()],
        ));
    }

    for phase in &provision.phases {
        let draft = match (&phase.script, &phase.command) {
            (Some(script), _) => PhaseDraft::script(
                phase.name.clone(),
                phase.target,
                payload_dir.join(script),
                format!("{}/{script}", provision.remote_dir.trim_end_matches('/')),
            ),
            (None, Some(command)) => {
                PhaseDraft::command(phase.name.clone(), phase.target, command.iter().cloned())
            }
            (None, None) => continue,
        };
        plan.push(draft);
    }
    plan
}

// ── Service ──────────────────────────────────────────────────────────────────

/// Path of the unit file inside the resource.
#[must_use]
pub fn service_unit_path(config: &SandboxConfig) -> String {
    format!("/etc/systemd/system/{}.service", config.service.name)
}

/// systemd unit keeping the interactive service alive in a detached
/// multiplexer session owned by the service user.
#[must_use]
pub fn service_unit(config: &SandboxConfig) -> String {
    let service = &config.service;
    let session = &service.session;
    format!(
        "[Unit]\n\
         Description=rebox interactive session ({session})\n\
         After=network-online.target\n\
         Wants=network-online.target\n\
         \n\
         [Service]\n\
         Type=forking\n\
         User={user}\n\
         WorkingDirectory={home}\n\
         Environment=TERM=xterm-256color\n\
         ExecStart=/usr/bin/tmux new-session -d -s {session} {command}\n\
         ExecStop=/usr/bin/tmux kill-session -t {session}\n\
         RemainAfterExit=yes\n\
         Restart=on-failure\n\
         RestartSec=5\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        user = config.provision.user,
        home = config.user_home(),
        command = service.command,
    )
}

/// Push the rendered unit from `unit_file`, then enable and start it.
#[must_use]
pub fn service_plan(config: &SandboxConfig, unit_file: &Path) -> PhasePlan {
    let unit = format!("{}.service", config.service.name);
    PhasePlan::new()
        .then(
            PhaseDraft::command(
                "service unit",
                ExecTarget::Resource,
                ["systemctl", "daemon-reload"],
            )
            .with_payload(Payload {
                local: unit_file.to_path_buf(),
                remote: service_unit_path(config),
                mode: 0o644,
            }),
        )
        .then(PhaseDraft::command(
            "service enable",
            ExecTarget::Resource,
            ["systemctl", "enable", "--now", unit.as_str()],
        ))
}

// ── External state ───────────────────────────────────────────────────────────

/// Clone (or fast-forward) the configured repository as the service user.
/// `None` when no repository is configured.
#[must_use]
pub fn clone_plan(config: &SandboxConfig) -> Option<PhasePlan> {
    let repository = config.clone.repository.as_deref()?;
    let dest = config.expand_home(&config.clone.dest);
    let branch = config
        .clone
        .branch
        .as_deref()
        .map(|b| format!("--branch {} ", quote(b)))
        .unwrap_or_default();
    let script = format!(
        "if [ -d {git_dir} ]; then git -C {dest} pull --ff-only; \
         else git clone {branch}{repo} {dest}; fi",
        git_dir = quote(&format!("{dest}/.git")),
        dest = quote(&dest),
        repo = quote(repository),
    );
    Some(PhasePlan::new().then(PhaseDraft::command(
        "clone external state",
        ExecTarget::Resource,
        [
            "runuser".to_string(),
            "-u".to_string(),
            config.provision.user.clone(),
            "--".to_string(),
            "sh".to_string(),
            "-c".to_string(),
            script,
        ],
    )))
}

// ── Verification ─────────────────────────────────────────────────────────────

/// The fixed post-build checklist.
#[must_use]
pub fn verification_checks(config: &SandboxConfig) -> Vec<VerificationCheck> {
    let verify = &config.verify;
    let mut checks = Vec::new();

    if !verify.runtime.is_empty() {
        checks.push(VerificationCheck::new(
            "service runtime installed",
            Probe::Command(verify.runtime.clone()),
        ));
    }
    for tool in &verify.tools {
        checks.push(VerificationCheck::new(
            format!("{tool} available"),
            Probe::Tool(tool.clone()),
        ));
    }
    for file in &verify.files {
        checks.push(VerificationCheck::new(
            format!("{file} present"),
            Probe::FileExists(config.expand_home(file)),
        ));
    }
    checks.push(VerificationCheck::new(
        "service unit active",
        Probe::ServiceActive(format!("{}.service", config.service.name)),
    ));
    if config.clone.repository.is_some() {
        let dest = config.expand_home(&config.clone.dest);
        checks.push(VerificationCheck::new(
            "external state cloned",
            Probe::DirExists(format!("{dest}/.git")),
        ));
    }
    if let Some(host) = &verify.ping {
        checks.push(VerificationCheck::new(
            format!("outbound network ({host})"),
            Probe::Command(vec![
                "ping".into(),
                "-c".into(),
                "1".into(),
                "-W".into(),
                "3".into(),
                host.clone(),
            ]),
        ));
    }
    for extra in &verify.extra {
        checks.push(VerificationCheck::new(
            extra.name.clone(),
            Probe::Command(extra.command.clone()),
        ));
    }
    checks
}

// ── Follow-ups ───────────────────────────────────────────────────────────────

/// Steps the operator still has to do by hand after a rebuild.
#[must_use]
pub fn manual_steps(config: &SandboxConfig) -> Vec<String> {
    let mut steps = vec![
        format!(
            "Authenticate the interactive service: pct enter {} then `runuser -u {} -- tmux attach -t {}`",
            config.resource.id, config.provision.user, config.service.session
        ),
        "Install workstation shortcuts: rebox client-setup".to_string(),
    ];
    if config.verify.tools.iter().any(|t| t == "tailscale") {
        steps.insert(
            1,
            format!(
                "Join the mesh VPN: pct exec {} -- tailscale up",
                config.resource.id
            ),
        );
    }
    steps.extend(config.manual_steps.iter().cloned());
    steps
}

// ── Client blocks ────────────────────────────────────────────────────────────

/// Blocks installed by `rebox client-setup`, relative to the user's `home`.
#[must_use]
pub fn client_blocks(config: &SandboxConfig, home: &Path) -> Vec<ConfigBlock> {
    let client = &config.client;
    let alias = &client.alias;

    let mut ssh_body = format!(
        "Host {alias}\n    HostName {host}\n    User {user}\n",
        host = config.client_host(),
        user = config.provision.user,
    );
    if let Some(identity) = &client.identity_file {
        ssh_body.push_str(&format!("    IdentityFile {identity}\n"));
        ssh_body.push_str("    IdentitiesOnly yes\n");
    }
    ssh_body.push_str("    RequestTTY yes\n");

    let profile_body = format!(
        "alias {alias}={}\n",
        quote(&format!(
            "ssh -t {alias} tmux new-session -A -s {}",
            config.service.session
        ))
    );

    vec![
        ConfigBlock::named(
            &format!("ssh-{alias}"),
            home.join(".ssh").join("config"),
            ssh_body,
        )
        .credential_bearing(),
        ConfigBlock::named(
            &format!("profile-{alias}"),
            home.join(&client.shell_profile),
            profile_body,
        ),
    ]
}

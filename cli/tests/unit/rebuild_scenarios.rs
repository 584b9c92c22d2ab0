//! End-to-end rebuild scenarios against a mocked host.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::Ipv4Addr;
use std::path::Path;

use rebox_cli::application::services::lifecycle::ReconcilePolicy;
use rebox_cli::application::services::rebuild::{Orchestrator, RebuildOutcome};
use rebox_cli::domain::config::{ExtraCheck, PhaseConfig};
use rebox_cli::domain::{ExecTarget, ProvisionError, ResourceStatus, SandboxConfig};

use crate::mocks::{FixedPrompt, MockHost, MockLocal, RecordingReporter};

fn fast_config() -> SandboxConfig {
    let mut cfg = SandboxConfig::default();
    cfg.preflight.reachability_host = None;
    cfg.wait.boot_timeout_secs = 0;
    cfg.wait.address_timeout_secs = 0;
    cfg.wait.poll_interval_ms = 1;
    cfg
}

fn script_config(dir: &Path, names: &[&str]) -> SandboxConfig {
    let mut cfg = fast_config();
    cfg.provision.phases = names
        .iter()
        .map(|name| {
            let file = format!("{name}.sh");
            std::fs::write(dir.join(&file), "#!/bin/sh\ntrue\n").unwrap();
            PhaseConfig {
                name: (*name).to_string(),
                script: Some(file),
                command: None,
                target: ExecTarget::Resource,
            }
        })
        .collect();
    cfg
}

fn command_config(names: &[&str]) -> SandboxConfig {
    let mut cfg = fast_config();
    cfg.provision.phases = names
        .iter()
        .map(|name| PhaseConfig {
            name: (*name).to_string(),
            script: None,
            command: Some(vec!["echo".to_string(), format!("step-{name}")]),
            target: ExecTarget::Resource,
        })
        .collect();
    cfg
}

#[tokio::test]
async fn fresh_build_runs_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = script_config(dir.path(), &["packages", "user", "runtime"]);
    let host = MockHost::empty();
    let local = MockLocal::default();
    let prompt = FixedPrompt::answering(Some(true));
    let reporter = RecordingReporter::default();

    let outcome = Orchestrator::new(&host, &local, &prompt, &reporter)
        .rebuild(&cfg, dir.path(), ReconcilePolicy::Ask)
        .await
        .expect("rebuild succeeds");

    let RebuildOutcome::Completed {
        report,
        address,
        phases_run,
        manual_steps,
    } = outcome
    else {
        panic!("expected a completed rebuild");
    };
    // payload directory + 3 scripts + unit push + enable
    assert_eq!(phases_run, 6);
    assert_eq!(address, Some(Ipv4Addr::new(10, 20, 0, 7)));
    assert!(report.all_passed());
    assert!(manual_steps.iter().any(|s| s.contains("client-setup")));

    assert_eq!(prompt.asked.get(), 0, "nothing to confirm on an empty host");
    assert_eq!(host.calls("create").len(), 1);
    assert_eq!(host.calls("destroy").len(), 0);
    assert_eq!(host.calls("push").len(), 4);
    assert!(host.raw_config.borrow().contains("/dev/net/tun"));

    for stage in ["Preflight", "Provision", "Verification", "Next steps"] {
        assert!(reporter.has("header", stage), "missing stage header {stage}");
    }
}

#[tokio::test]
async fn scripts_are_pushed_before_they_run() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = script_config(dir.path(), &["packages"]);
    let host = MockHost::empty();
    let reporter = RecordingReporter::default();

    Orchestrator::new(&host, &MockLocal::default(), &FixedPrompt::answering(None), &reporter)
        .rebuild(&cfg, dir.path(), ReconcilePolicy::Ask)
        .await
        .unwrap();

    let log = host.log.borrow();
    let push = log
        .iter()
        .position(|c| c.starts_with("push") && c.contains("packages.sh"))
        .expect("script pushed");
    let run = log
        .iter()
        .position(|c| c.starts_with("exec") && c.contains("bash /root/rebox/packages.sh"))
        .expect("script executed");
    assert!(push < run);
}

#[tokio::test]
async fn declined_rebuild_changes_nothing() {
    let cfg = command_config(&["one"]);
    let host = MockHost::running();
    let prompt = FixedPrompt::answering(Some(false));
    let reporter = RecordingReporter::default();

    let outcome = Orchestrator::new(&host, &MockLocal::default(), &prompt, &reporter)
        .rebuild(&cfg, Path::new("."), ReconcilePolicy::Ask)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RebuildOutcome::Aborted {
            status: ResourceStatus::Running
        }
    );
    assert_eq!(prompt.asked.get(), 1);
    assert!(host.calls("stop").is_empty());
    assert!(host.calls("destroy").is_empty());
    assert!(host.calls("create").is_empty());
    assert!(host.calls("exec").is_empty());
}

#[tokio::test]
async fn dismissed_prompt_counts_as_decline() {
    let host = MockHost::running();
    let outcome = Orchestrator::new(
        &host,
        &MockLocal::default(),
        &FixedPrompt::answering(None),
        &RecordingReporter::default(),
    )
    .rebuild(&command_config(&["one"]), Path::new("."), ReconcilePolicy::Ask)
    .await
    .unwrap();

    assert!(matches!(outcome, RebuildOutcome::Aborted { .. }));
    assert!(host.calls("destroy").is_empty());
}

#[tokio::test]
async fn assume_yes_replaces_existing_resource_without_asking() {
    let host = MockHost::running();
    let prompt = FixedPrompt::answering(Some(false));

    let outcome = Orchestrator::new(
        &host,
        &MockLocal::default(),
        &prompt,
        &RecordingReporter::default(),
    )
    .rebuild(&command_config(&["one"]), Path::new("."), ReconcilePolicy::AssumeYes)
    .await
    .unwrap();

    assert!(matches!(outcome, RebuildOutcome::Completed { .. }));
    assert_eq!(prompt.asked.get(), 0);
    let log = host.log.borrow();
    let stop = log.iter().position(|c| c.starts_with("stop")).unwrap();
    let destroy = log.iter().position(|c| c.starts_with("destroy")).unwrap();
    let create = log.iter().position(|c| c.starts_with("create")).unwrap();
    assert!(stop < destroy && destroy < create);
}

#[tokio::test]
async fn failing_phase_stops_the_pipeline() {
    let cfg = command_config(&["one", "two", "three", "four"]);
    let host = MockHost::empty().failing_exec("step-two");
    let reporter = RecordingReporter::default();

    let err = Orchestrator::new(
        &host,
        &MockLocal::default(),
        &FixedPrompt::answering(None),
        &reporter,
    )
    .rebuild(&cfg, Path::new("."), ReconcilePolicy::Ask)
    .await
    .expect_err("phase two fails");

    let message = err.to_string();
    assert!(message.contains("phase 2 'two' failed"), "{message}");
    assert!(message.contains("Unable to locate package"), "{message}");
    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::Phase(_))
    ));
    assert!(host.calls("exec 200 echo step-three").is_empty());
    assert!(host.calls("exec 200 echo step-four").is_empty());
    assert!(!reporter.has("header", "Verification"));
}

#[tokio::test]
async fn failed_checks_do_not_fail_the_rebuild() {
    let mut cfg = command_config(&["one"]);
    cfg.verify.extra = vec![
        ExtraCheck {
            name: "broken probe".to_string(),
            command: vec!["probe-that-fails".to_string()],
        },
        ExtraCheck {
            name: "later probe".to_string(),
            command: vec!["true".to_string()],
        },
    ];
    let host = MockHost::empty().failing_exec("probe-that-fails");
    let reporter = RecordingReporter::default();

    let outcome = Orchestrator::new(
        &host,
        &MockLocal::default(),
        &FixedPrompt::answering(None),
        &reporter,
    )
    .rebuild(&cfg, Path::new("."), ReconcilePolicy::Ask)
    .await
    .expect("verification failures are not fatal");

    let RebuildOutcome::Completed { report, .. } = outcome else {
        panic!("expected a completed rebuild");
    };
    assert_eq!(report.failures(), vec!["broken probe"]);
    let later = report
        .results
        .iter()
        .find(|r| r.name == "later probe")
        .expect("later check still ran");
    assert!(later.passed);
    assert!(reporter.has("warn", "checks passed"));
    assert!(reporter.has("header", "Next steps"));
}

#[tokio::test]
async fn missing_payload_fails_before_any_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = script_config(dir.path(), &["present"]);
    cfg.provision.phases.push(PhaseConfig {
        name: "absent".to_string(),
        script: Some("absent.sh".to_string()),
        command: None,
        target: ExecTarget::Resource,
    });
    let host = MockHost::running();

    let err = Orchestrator::new(
        &host,
        &MockLocal::default(),
        &FixedPrompt::answering(Some(true)),
        &RecordingReporter::default(),
    )
    .rebuild(&cfg, dir.path(), ReconcilePolicy::AssumeYes)
    .await
    .expect_err("missing payload");

    assert!(err.to_string().contains("absent.sh"));
    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::Precondition(_))
    ));
    assert!(host.log.borrow().is_empty(), "host untouched");
}

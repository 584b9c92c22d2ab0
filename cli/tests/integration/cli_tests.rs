//! Argument parsing, help output, and error reporting of the binary.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn rebox() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rebox"));
    cmd.env("NO_COLOR", "1").env_remove("REBOX_YES");
    cmd
}

fn invalid_config() -> tempfile::NamedTempFile {
    let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    std::fs::write(file.path(), "resource:\n  hostname: \"not valid!\"\n").unwrap();
    file
}

// --- Help and version ---

#[test]
fn test_help_lists_every_command() {
    rebox()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("rebuild"))
        .stdout(predicate::str::contains("client-setup"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("verify"));
}

#[test]
fn test_version_flag_shows_binary_name() {
    rebox()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rebox"));
}

#[test]
fn test_rebuild_help_mentions_confirmation() {
    rebox()
        .args(["rebuild", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));
}

#[test]
fn test_unknown_subcommand_is_rejected() {
    rebox()
        .arg("explode")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// --- Configuration errors ---

#[test]
fn test_invalid_config_fails_before_touching_the_host() {
    let cfg = invalid_config();
    rebox()
        .args(["--config", cfg.path().to_str().unwrap(), "status"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("✗"))
        .stderr(predicate::str::contains("invalid configuration in"))
        .stderr(predicate::str::contains("resource.hostname"));
}

#[test]
fn test_unparseable_config_names_the_file() {
    let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    std::fs::write(file.path(), "resource: [unclosed\n").unwrap();
    rebox()
        .env("REBOX_CONFIG", file.path())
        .arg("verify")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot parse"));
}

#[test]
fn test_json_mode_reports_errors_as_json() {
    let cfg = invalid_config();
    let output = rebox()
        .args(["--json", "--config", cfg.path().to_str().unwrap(), "status"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is a JSON error object");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "invalid_config");
    assert!(
        value["message"]
            .as_str()
            .unwrap()
            .contains("resource.hostname")
    );
}

//! `rebox client-setup` against a throwaway home directory.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;

fn client_setup(home: &Path, config: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rebox"));
    cmd.env("NO_COLOR", "1")
        .env("HOME", home)
        .env("REBOX_CONFIG", config)
        .arg("client-setup");
    cmd
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.yaml");
    std::fs::write(
        &path,
        "client:\n  alias: devbox\n  host: devbox.tailnet.example\n  identity_file: ~/.ssh/id_ed25519\n",
    )
    .unwrap();
    path
}

fn backups(dir: &Path, stem: &str) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(&format!("{stem}.rebox-backup-")))
        .collect()
}

#[test]
#[serial]
fn test_client_setup_creates_ssh_entry_and_alias() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(home.path());

    client_setup(home.path(), &config).assert().success();

    let ssh_config = home.path().join(".ssh").join("config");
    let ssh = std::fs::read_to_string(&ssh_config).unwrap();
    assert!(ssh.contains("# >>> rebox:ssh-devbox >>>"));
    assert!(ssh.contains("HostName devbox.tailnet.example"));
    assert!(ssh.contains("IdentityFile ~/.ssh/id_ed25519"));
    let mode = std::fs::metadata(&ssh_config).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);

    let profile = std::fs::read_to_string(home.path().join(".bashrc")).unwrap();
    assert!(profile.contains("alias devbox="));
    assert!(profile.contains("tmux new-session -A -s main"));
}

#[test]
#[serial]
fn test_client_setup_twice_is_a_no_op() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(home.path());

    client_setup(home.path(), &config).assert().success();
    let first = std::fs::read_to_string(home.path().join(".bashrc")).unwrap();

    client_setup(home.path(), &config)
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing changed"));
    let second = std::fs::read_to_string(home.path().join(".bashrc")).unwrap();

    assert_eq!(first, second);
    assert!(backups(home.path(), ".bashrc").is_empty());
}

#[test]
#[serial]
fn test_client_setup_backs_up_existing_profile() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(home.path());
    let original = "export EDITOR=vim";
    std::fs::write(home.path().join(".bashrc"), original).unwrap();

    client_setup(home.path(), &config).assert().success();

    let saved = backups(home.path(), ".bashrc");
    assert_eq!(saved.len(), 1, "exactly one backup: {saved:?}");
    let backup = std::fs::read_to_string(home.path().join(&saved[0])).unwrap();
    assert_eq!(backup, original);

    let profile = std::fs::read_to_string(home.path().join(".bashrc")).unwrap();
    assert!(profile.starts_with("export EDITOR=vim\n\n# >>> rebox:profile-devbox >>>"));
}

#[test]
#[serial]
fn test_client_setup_json_lists_files() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(home.path());

    let output = client_setup(home.path(), &config)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let files = value["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f["installed"] == true));
}

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_config_path_command() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("dashboard")
        .env("DASHBOARD_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_creates_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    assert!(!config_path.exists());

    cargo_bin_cmd!("dashboard")
        .env("DASHBOARD_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config at"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("[main_window]"));
    assert!(contents.contains("locations = [\"auto:ip\"]"));
    assert!(contents.contains("# api_key ="));
}

#[test]
fn test_config_init_fails_if_exists() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "# existing config").unwrap();

    cargo_bin_cmd!("dashboard")
        .env("DASHBOARD_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_missing_config_is_fatal() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("dashboard")
        .env("DASHBOARD_HOME", dir.path())
        .args(["locations", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dashboard config init"));
}

#[test]
fn test_dashboard_needs_a_terminal() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "[weather]\napi_key = \"test\"\n",
    )
    .unwrap();

    cargo_bin_cmd!("dashboard")
        .env("DASHBOARD_HOME", dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires a terminal"));
}

#[test]
fn test_config_help_shows_subcommands() {
    cargo_bin_cmd!("dashboard")
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("path"))
        .stdout(predicate::str::contains("init"));
}

//! Command-line surface and early validation errors.

use predicates::prelude::*;

use crate::common::{TestPanel, arg};

#[test]
fn test_help_lists_upgrade() {
    let panel = TestPanel::new();
    panel
        .command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("upgrade"))
        .stdout(predicate::str::contains("--no-progress"));
}

#[test]
fn test_upgrade_help_shows_flags() {
    let panel = TestPanel::new();
    panel
        .command()
        .args(["upgrade", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--user"))
        .stdout(predicate::str::contains("--url"))
        .stdout(predicate::str::contains("--release"))
        .stdout(predicate::str::contains("--skip-download"))
        .stdout(predicate::str::contains("--no-interaction"));
}

#[test]
fn test_unknown_flag_is_rejected() {
    let panel = TestPanel::new();
    panel.command().args(["upgrade", "--force"]).assert().failure();
}

#[test]
fn test_invalid_user_fails_before_running() {
    let panel = TestPanel::new();
    panel
        .command()
        .args(["upgrade", "-n", "--skip-download", "--user", "www-data;id", "--path"])
        .arg(arg(&panel.root()))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("$upgrader>").not())
        .stderr(predicate::str::contains("Invalid user name"))
        .stderr(predicate::str::contains("--user"));
}

#[test]
fn test_invalid_release_is_rejected() {
    let panel = TestPanel::new();
    panel
        .command()
        .args(["upgrade", "-n", "--release", "latest-ish", "--path"])
        .arg(arg(&panel.root()))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid release version: 'latest-ish'"));
}

#[test]
fn test_missing_install_dir() {
    let panel = TestPanel::new();
    panel
        .command()
        .args(["upgrade", "-n", "--skip-download", "--path"])
        .arg(arg(&panel.temp.path().join("nowhere")))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_invalid_settings_are_reported() {
    let panel = TestPanel::new();
    panel.write_config("release_url = \"https://mirror.example/panel.tar.gz\"\n");

    panel
        .command()
        .args(["upgrade", "-n", "--skip-download", "--path"])
        .arg(arg(&panel.root()))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("release_url"));
}

#[test]
fn test_malformed_settings_file() {
    let panel = TestPanel::new();
    panel.write_config("php = [\n");

    panel
        .command()
        .args(["upgrade", "-n", "--skip-download", "--path"])
        .arg(arg(&panel.root()))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("TOML parsing error"));
}

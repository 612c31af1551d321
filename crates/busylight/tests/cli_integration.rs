//! Integration tests for the `busylight-cli` binary.
//!
//! Commands that need a light are only exercised up to argument validation,
//! so the suite passes on machines without a blink(1) attached.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn cli() -> assert_cmd::Command {
    cargo_bin_cmd!("busylight-cli")
}

/// A config path inside a fresh temp dir, so the user's real config is never read.
fn temp_config() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    (dir, path)
}

#[test]
fn cli_help_lists_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("busylight-cli"))
        .stdout(predicate::str::contains("for"))
        .stdout(predicate::str::contains("devices"));
}

#[test]
fn cli_version_prints_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_config_json_produces_valid_json() {
    let (_dir, path) = temp_config();
    let output = cli()
        .args(["--json", "--config"])
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value =
        serde_json::from_slice(&output).expect("config --json should produce valid JSON");
    assert_eq!(json["settings"]["alert_color"], "red");
    assert_eq!(json["config_file_exists"], false);
    assert!(json["problems"].as_array().unwrap().is_empty());
}

#[test]
fn cli_config_reports_problems() {
    let (_dir, path) = temp_config();
    std::fs::write(&path, "alert_color = \"black\"\npresets = [\"soon\"]\n").unwrap();
    let output = cli()
        .args(["--json", "--config"])
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["config_file_exists"], true);
    assert_eq!(json["problems"].as_array().unwrap().len(), 2);
}

#[test]
fn cli_config_human_output() {
    let (_dir, path) = temp_config();
    cli()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("not found, using defaults"))
        .stdout(predicate::str::contains("30m (30 Minutes)"));
}

#[test]
fn cli_verbose_flags_accepted() {
    let (_dir, path) = temp_config();
    cli().arg("--config").arg(&path).args(["-v", "config"]).assert().success();
    cli()
        .arg("--config")
        .arg(&path)
        .args(["--verbose", "config"])
        .assert()
        .success();
}

#[test]
fn cli_devices_succeeds() {
    cli().arg("devices").assert().success();
}

#[test]
fn cli_devices_json_has_count() {
    let output = cli()
        .args(["devices", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(json["count"].is_u64());
    assert!(json["devices"].is_array());
}

#[test]
fn cli_status_json_succeeds() {
    let (_dir, path) = temp_config();
    let output = cli()
        .args(["status", "--json", "--config"])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["config"]["presets"][2], "1.5 Hours");
}

#[test]
fn cli_for_rejects_invalid_duration() {
    cli()
        .args(["for", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid duration"));
}

#[test]
fn cli_for_rejects_duration_beyond_a_week() {
    for input in ["18446744073709551615", "5000000000000000h", "169h"] {
        cli()
            .args(["for", input])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid duration"));
    }
}

#[test]
fn cli_for_rejects_zero_duration() {
    cli()
        .args(["for", "0m"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn cli_for_requires_duration() {
    cli().arg("for").assert().failure();
}

#[test]
fn cli_on_off_help_succeed() {
    cli().args(["on", "--help"]).assert().success();
    cli().args(["off", "--help"]).assert().success();
}

#[test]
fn cli_unknown_subcommand_fails() {
    cli().arg("blink").assert().failure();
}

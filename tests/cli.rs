use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

fn config_learn(root: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("config-learn").unwrap();
    cmd.env("CONFIG_LEARN_ROOT", root)
        .env("CONFIG_LEARN_CONFIG", root.join("config.toml"))
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("config-learn").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("thresholds"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("config-learn").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_run_help_lists_flags() {
    let mut cmd = Command::cargo_bin("config-learn").unwrap();
    cmd.args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--non-interactive"))
        .stdout(predicate::str::contains("--confidence-threshold"))
        .stdout(predicate::str::contains("--no-meta-learning"));
}

#[test]
fn test_empty_run_is_clean() {
    let dir = tempdir().unwrap();
    config_learn(dir.path())
        .args(["run", "--non-interactive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No improvements identified"));
}

#[test]
fn test_robot_empty_run() {
    let dir = tempdir().unwrap();
    let output = config_learn(dir.path())
        .args(["--robot", "run", "--non-interactive"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["data"]["report"]["total_suggestions"], 0);
    assert_eq!(json["data"]["summary"]["calibration"]["status"], "recorded");
}

#[test]
fn test_unknown_category_rejected() {
    let dir = tempdir().unwrap();
    config_learn(dir.path())
        .args(["run", "--category", "telepathy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("telepathy"));
}

#[test]
fn test_invalid_config_is_robot_error() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[calibration]\nlow_water = 0.9\nhigh_water = 0.1\n",
    )
    .unwrap();
    let output = config_learn(dir.path())
        .args(["--robot", "thresholds", "show"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"]["error"]["code"], "config");
}

#[test]
fn test_rejections_compact_on_empty_log() {
    let dir = tempdir().unwrap();
    let output = config_learn(dir.path())
        .args(["--robot", "rejections", "compact"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["data"]["kept"], 0);
    assert_eq!(json["data"]["removed"], 0);
}

//! Smoke tests for the `wikai` binary
//!
//! HOME points at a temporary directory so no user configuration is read.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

/// Builds a `wikai` command isolated from the user's environment.
fn wikai(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wikai").expect("Binary should build");
    cmd.env("HOME", home.path())
        .env_remove("WIKAI_PATTERNS_DIR")
        .env_remove("WIKAI_STABILITY_THRESHOLD")
        .env_remove("WIKAI_SYSTEM_NAME")
        .env_remove("RUST_LOG")
        .arg("--patterns-dir")
        .arg(home.path().join("patterns"));
    cmd
}

#[test]
fn test_help() {
    let home = tempdir().unwrap();
    wikai(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("capture"))
        .stdout(predicate::str::contains("observe"));
}

#[test]
fn test_capture_then_show_json() {
    let home = tempdir().unwrap();
    wikai(&home)
        .args(["capture", "Bounded retries", "Retry at most three times"])
        .args(["--stability", "0.9", "--tag", "resilience"])
        .assert()
        .success()
        .stdout(predicate::str::contains("WIKAI_0001"));

    wikai(&home)
        .args(["show", "WIKAI_0001", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"Bounded retries\""))
        .stdout(predicate::str::contains("\"stability_score\": 0.9"));
}

#[test]
fn test_capture_blank_title_fails() {
    let home = tempdir().unwrap();
    wikai(&home)
        .args(["capture", "", "Axiom"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid pattern"));
}

#[test]
fn test_show_unknown_id_fails() {
    let home = tempdir().unwrap();
    wikai(&home)
        .args(["show", "WIKAI_0042"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Pattern not found"));
}

#[test]
fn test_observe_stdin_captures() {
    let home = tempdir().unwrap();
    let events = concat!(
        r#"{"event": "convergence", "title": "T", "axiom": "A", "stability": 0.5}"#,
        "\n",
        r#"{"event": "convergence", "title": "T", "axiom": "A", "stability": 0.85}"#,
        "\n",
        r#"{"event": "convergence", "title": "T", "axiom": "A", "stability": 0.95}"#,
        "\n",
    );
    wikai(&home)
        .args(["observe", "--format", "json"])
        .write_stdin(events)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"captured\": [\n    \"WIKAI_0001\"\n  ]"));

    wikai(&home)
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("WIKAI_0001"))
        .stdout(predicate::str::contains("WIKAI_0002").not());
}

#[test]
fn test_stats_empty() {
    let home = tempdir().unwrap();
    wikai(&home)
        .args(["stats", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 0"));
}

#[test]
fn test_config_set_and_get() {
    let home = tempdir().unwrap();
    wikai(&home)
        .args(["config", "set", "system_name", "Forge"])
        .assert()
        .success();
    wikai(&home)
        .args(["config", "get", "system_name"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Forge"));
}

#[test]
fn test_schema_lists_pattern_fields() {
    let home = tempdir().unwrap();
    wikai(&home)
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("validation_history"));
}

//! Integration tests for the `camlay` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! config handling and a dry-run preview against a mock OctoPrint server.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `camlay` binary with env isolation.
///
/// Clears `CAMLAY_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn camlay_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("camlay");
    cmd.env("HOME", "/tmp/camlay-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/camlay-cli-test-nonexistent")
        .env_remove("CAMLAY_CONFIG")
        .env_remove("CAMLAY_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = camlay_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    camlay_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("OctoPrint")
            .and(predicate::str::contains("run"))
            .and(predicate::str::contains("preview"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    camlay_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("camlay"));
}

#[test]
fn test_invalid_progress_source() {
    camlay_cmd()
        .args(["run", "--progress-source", "slicer"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("expected 'firmware'"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    camlay_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    camlay_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_default() {
    camlay_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("camlay").and(predicate::str::contains("config.toml")));
}

#[test]
fn test_config_path_override() {
    camlay_cmd()
        .args(["--config", "/tmp/elsewhere/camlay.toml", "config", "path"])
        .assert()
        .success()
        .stdout("/tmp/elsewhere/camlay.toml\n");
}

#[test]
fn test_config_show_masks_secrets() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
        [camera]
        host = "192.168.1.108"
        password = "hunter2"

        [printer]
        url = "http://octopi.local"
        api_key_env = "OCTO_KEY"
        "#,
    );

    camlay_cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("host = \"192.168.1.108\"")
                .and(predicate::str::contains("password = \"****\""))
                .and(predicate::str::contains("api_key_env = \"OCTO_KEY\""))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_config_show_json_applies_flag_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[camera]\nhost = \"cam.local\"\n");

    let output = camlay_cmd()
        .arg("--config")
        .arg(&path)
        .args(["--camera-host", "10.0.0.9", "--dry-run", "-o", "json"])
        .args(["config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["camera"]["host"], "10.0.0.9");
    assert_eq!(shown["camera"]["send"], false);
    assert_eq!(shown["overlay"]["interval"], 10);
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = camlay_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_preview_without_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[camera]\nhost = \"cam.local\"\n");

    camlay_cmd()
        .arg("--config")
        .arg(&path)
        .arg("preview")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No camera password configured"));
}

#[test]
fn test_zero_interval_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "[camera]\npassword = \"x\"\n[printer]\napi_key = \"k\"\n[overlay]\ninterval = 0\n",
    );

    camlay_cmd()
        .arg("--config")
        .arg(&path)
        .arg("preview")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("overlay.interval"));
}

// ── Preview against a mock OctoPrint ────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_preview_dry_run_renders_overlay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job": {
                "file": { "name": "benchy.gcode" },
                "estimatedPrintTime": 7200
            },
            "progress": { "completion": 12.5 },
            "state": "Printing"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/printer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "temperature": {
                "tool0": { "actual": 210.4, "target": 215.0 },
                "bed": { "actual": 60.9, "target": 60.0 }
            },
            "state": { "text": "Printing" }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        &format!(
            "[camera]\nhost = \"cam.invalid\"\n\n[printer]\nurl = \"{}\"\napi_key = \"k\"\n",
            server.uri()
        ),
    );

    let output = camlay_cmd()
        .arg("--config")
        .arg(&path)
        .args(["--dry-run", "-o", "plain", "preview"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let encoded = String::from_utf8(output.stdout).unwrap();
    let encoded = encoded.trim_end();
    assert!(
        encoded.starts_with("Printing|210/215%20-%2060/60|0%25%20-%200%3A00|"),
        "unexpected overlay: {encoded}"
    );
    assert!(encoded.ends_with("|benchy.gcode"), "unexpected overlay: {encoded}");
    assert_eq!(encoded.matches('|').count(), 4);
}

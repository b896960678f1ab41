//! Integration tests for the `hallctl` binary.
//!
//! Argument parsing, configuration errors, and end-to-end commands against
//! a wiremock backend. Nothing touches the user's real configuration.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `hallctl` binary with env isolation.
fn hallctl_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("hallctl");
    cmd.env("HOME", "/tmp/hallctl-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/hallctl-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("HALLCTL_CONFIG")
        .env_remove("HALLCTL_BACKEND__URL")
        .env_remove("HALLCTL_BACKEND__PUSH")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Write a config with two venues (only `hall1` has audio) pointing at
/// `backend_url`, with no step delay and push disabled.
fn write_config(dir: &Path, backend_url: &str) -> PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(
        &path,
        format!(
            r#"
[backend]
url = "{backend_url}"
timeout_secs = 2
poll_interval_ms = 100
push = "off"

[shutdown]
step_delay_ms = 0

[[venues]]
id = "hall1"
name = "Hall 1"
ip = "192.168.198.31"
tms_id = "barco_1"
cp750_id = "cp1"

[[venues]]
id = "hall2"
name = "Hall 2"
address = "192.168.198.32"
"#
        ),
    )
    .unwrap();
    path
}

fn ack() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "ok": true }))
}

async fn mount_post(server: &MockServer, route: &str, body: Option<Value>, reply: ResponseTemplate) {
    let mock = Mock::given(method("POST")).and(path(route));
    let mock = match body {
        Some(body) => mock.and(body_json(body)),
        None => mock,
    };
    mock.respond_with(reply).expect(1).mount(server).await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = hallctl_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    hallctl_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("venues")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("shutdown")),
    );
}

#[test]
fn test_version_flag() {
    hallctl_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hallctl"));
}

#[test]
fn test_completions_zsh() {
    hallctl_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_subcommand() {
    let output = hallctl_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("foobar"));
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_missing_explicit_config_is_usage_error() {
    hallctl_cmd()
        .args(["--config", "/tmp/hallctl-cli-test-nonexistent/none.toml", "venues"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_no_venues_configured() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[backend]\nurl = \"http://127.0.0.1:9\"\n").unwrap();

    hallctl_cmd()
        .arg("--config")
        .arg(&config)
        .arg("venues")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No venues configured"));
}

#[test]
fn test_venues_table() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:9");

    hallctl_cmd()
        .arg("--config")
        .arg(&config)
        .arg("venues")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Hall 1")
                .and(predicate::str::contains("192.168.198.31:43748"))
                .and(predicate::str::contains("barco_1")),
        );
}

#[test]
fn test_venues_json_applies_registry_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:9");

    let output = hallctl_cmd()
        .arg("--config")
        .arg(&config)
        .args(["-o", "json", "venues"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let venues: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(venues[0]["device_id"], "barco_1");
    assert_eq!(venues[0]["audio_device_id"], "cp1");
    assert_eq!(venues[1]["device_id"], "hall2");
    assert_eq!(venues[1]["audio_device_id"], Value::Null);
}

// ── Validation before dispatch ──────────────────────────────────────

#[test]
fn test_unknown_venue_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:9");

    hallctl_cmd()
        .arg("--config")
        .arg(&config)
        .args(["command", "hall9", "stop"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("hall9"));
}

#[test]
fn test_out_of_range_level_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:9");

    hallctl_cmd()
        .arg("--config")
        .arg(&config)
        .args(["command", "hall1", "level", "150"])
        .assert()
        .code(9)
        .stderr(predicate::str::contains("outside 0..=100"));
}

#[test]
fn test_shutdown_requires_yes_without_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:9");

    hallctl_cmd()
        .arg("--config")
        .arg(&config)
        .args(["shutdown", "hall1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("requires confirmation"));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_command_stop_acknowledged() {
    let server = MockServer::start().await;
    mount_post(&server, "/api/barco_1/stop", None, ack()).await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    hallctl_cmd()
        .arg("--config")
        .arg(&config)
        .args(["command", "hall1", "stop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stop on hall1: ok"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_command_nack_fails() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/api/barco_1/lamp",
        Some(json!({ "on": true })),
        ResponseTemplate::new(200).set_body_json(json!({ "ok": false, "error": "lamp hours" })),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    hallctl_cmd()
        .arg("--config")
        .arg(&config)
        .args(["command", "hall1", "lamp", "on"])
        .assert()
        .code(9)
        .stderr(predicate::str::contains("lamp hours"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_command_light_on() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/api/barco_1/light/on",
        None,
        ResponseTemplate::new(200).set_body_json(json!({ "success": true })),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    let output = hallctl_cmd()
        .arg("--config")
        .arg(&config)
        .args(["-o", "json", "command", "hall1", "light", "on"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let reply: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reply["command"], json!({ "command": "light", "on": true }));
    assert_eq!(reply["success"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_runs_all_steps_in_json() {
    let server = MockServer::start().await;
    mount_post(&server, "/api/barco_1/stop", None, ack()).await;
    mount_post(&server, "/api/barco_1/dowser", Some(json!({ "closed": true })), ack()).await;
    mount_post(&server, "/api/barco_1/lamp", Some(json!({ "on": false })), ack()).await;
    mount_post(
        &server,
        "/api/cp750/cp1/fader",
        Some(json!({ "value": 30, "force": true })),
        ack(),
    )
    .await;
    mount_post(
        &server,
        "/api/cp750/cp1/input-mode",
        Some(json!({ "mode": "non_sync" })),
        ack(),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    let output = hallctl_cmd()
        .arg("--config")
        .arg(&config)
        .args(["--yes", "-o", "json", "shutdown", "hall1"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let run: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(run["outcome"], "success");
    assert_eq!(run["steps"].as_array().unwrap().len(), 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_continues_past_failure() {
    let server = MockServer::start().await;
    mount_post(&server, "/api/barco_1/stop", None, ResponseTemplate::new(502)).await;
    mount_post(&server, "/api/barco_1/dowser", None, ack()).await;
    mount_post(&server, "/api/barco_1/lamp", None, ack()).await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    // hall2 has no audio processor: two steps are skipped
    hallctl_cmd()
        .arg("--config")
        .arg(&config)
        .args(["--yes", "shutdown", "hall2"])
        .assert()
        .code(9)
        .stdout(
            predicate::str::contains("completed with errors")
                .and(predicate::str::contains("skipped")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_reads_polled_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": {
                "barco_1": {
                    "playback": { "status": "playing", "title": "Feature", "position": 65 },
                    "projector": { "lamp_on": true, "dowser_closed": false }
                }
            },
            "cp750": { "cp1": { "fader": 45, "muted": false } }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    let output = hallctl_cmd()
        .arg("--config")
        .arg(&config)
        .args(["-o", "json", "status", "hall1"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let status: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["venue_id"], "hall1");
    assert_eq!(status["health"], "degraded");
    assert_eq!(status["device"]["playback"], "playing");
    assert_eq!(status["device"]["lamp"], "on");
    assert_eq!(status["audio"]["level"], 45);
}

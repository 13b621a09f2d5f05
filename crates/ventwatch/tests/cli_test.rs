//! Integration tests for the `ventwatch` CLI binary.
//!
//! Argument parsing, help, completions and error exits run without any
//! API. The remaining tests point the binary at a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// `ventwatch` with env isolation: config lives under `home`, and no
/// `VENTWATCH_*` variable leaks in from the developer's shell.
fn ventwatch_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("ventwatch");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("VENTWATCH_PROFILE")
        .env_remove("VENTWATCH_API_URL")
        .env_remove("VENTWATCH_API_KEY")
        .env_remove("VENTWATCH_TOKEN")
        .env_remove("VENTWATCH_OUTPUT")
        .env_remove("VENTWATCH_UNITS")
        .env_remove("VENTWATCH_INSECURE")
        .env_remove("VENTWATCH_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn status_body() -> serde_json::Value {
    json!({
        "deviceId": "esp32-vent-01",
        "timestamp": "2026-10-16T08:30:00Z",
        "sensors": {
            "indoor":  { "temp": 24.0, "humidity": 50.0 },
            "outdoor": { "temp": 18.0, "humidity": 60.0 }
        },
        "system": { "fanOn": true, "uptime": 3600, "wifiRssi": -58 }
    })
}

async fn mount_status(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .and(header("X-API-Secret", "k-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .mount(server)
        .await;
}

async fn mount_unauthorized(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(expected)
        .mount(server)
        .await;
}

fn saved_config(home: &Path) -> String {
    std::fs::read_to_string(home.join(".config/ventwatch/config.toml")).unwrap()
}

/// Save a plaintext key for the default profile, pointed at `server`.
fn plaintext_login(home: &Path, server: &MockServer) {
    ventwatch_cmd(home)
        .args([
            "login",
            "--no-verify",
            "--plaintext",
            "--link",
            &format!("{}/dashboard?apikey=stored-key", server.uri()),
        ])
        .assert()
        .success();
}

/// Run a prepared command off the async runtime.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = TempDir::new().unwrap();
    let output = ventwatch_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    ventwatch_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("status")
                .and(predicate::str::contains("dashboard"))
                .and(predicate::str::contains("history"))
                .and(predicate::str::contains("incidents"))
                .and(predicate::str::contains("doors")),
        );
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    ventwatch_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ventwatch"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_zsh() {
    let home = TempDir::new().unwrap();
    ventwatch_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    ventwatch_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_status_without_config_is_usage_error() {
    let home = TempDir::new().unwrap();
    ventwatch_cmd(home.path())
        .arg("status")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No API configured"));
}

#[test]
fn test_invalid_output_format() {
    let home = TempDir::new().unwrap();
    let output = ventwatch_cmd(home.path())
        .args(["--output", "invalid", "status"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_invalid_history_range() {
    let home = TempDir::new().unwrap();
    ventwatch_cmd(home.path())
        .args(["history", "--range", "3d"])
        .assert()
        .code(2);
}

#[test]
fn test_login_without_tty_needs_flags() {
    let home = TempDir::new().unwrap();
    ventwatch_cmd(home.path())
        .arg("login")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--link"));
}

#[test]
fn test_link_without_key_is_rejected() {
    let home = TempDir::new().unwrap();
    ventwatch_cmd(home.path())
        .args(["login", "--no-verify", "--link", "https://vent.example/dashboard?x=1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("apikey"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    let home = TempDir::new().unwrap();
    ventwatch_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_plaintext_login_is_masked_in_config_show() {
    let home = TempDir::new().unwrap();
    ventwatch_cmd(home.path())
        .args([
            "login",
            "--no-verify",
            "--plaintext",
            "--link",
            "https://vent.example/dashboard?apikey=s3cret-key",
        ])
        .assert()
        .success();

    ventwatch_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("api_url = \"https://vent.example/api/\"")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("s3cret-key").not()),
        );

    ventwatch_cmd(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));
}

#[test]
fn test_config_use_unknown_profile() {
    let home = TempDir::new().unwrap();
    ventwatch_cmd(home.path())
        .args(["config", "use", "cabin"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cabin"));
}

// ── Against a mock API ──────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_status_json_with_flags() {
    let server = MockServer::start().await;
    mount_status(&server).await;

    let home = TempDir::new().unwrap();
    let mut cmd = ventwatch_cmd(home.path());
    cmd.args([
        "--api-url",
        &format!("{}/api/", server.uri()),
        "--api-key",
        "k-123",
        "-o",
        "json",
        "status",
    ]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["device_id"], "esp32-vent-01");
    assert_eq!(body["system"]["fan_on"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_plain_in_fahrenheit() {
    let server = MockServer::start().await;
    mount_status(&server).await;

    let home = TempDir::new().unwrap();
    let mut cmd = ventwatch_cmd(home.path());
    cmd.args([
        "--api-url",
        &format!("{}/api/", server.uri()),
        "--api-key",
        "k-123",
        "-u",
        "f",
        "-o",
        "plain",
        "status",
    ]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Indoor 75.2 50.0 -"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_key_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let mut cmd = ventwatch_cmd(home.path());
    cmd.args([
        "--api-url",
        &format!("{}/api/", server.uri()),
        "--api-key",
        "wrong",
        "status",
    ]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_forgets_revoked_plaintext_key() {
    let server = MockServer::start().await;
    // Two rejected refresh cycles of five requests, then nothing.
    mount_unauthorized(&server, 10).await;

    let home = TempDir::new().unwrap();
    plaintext_login(home.path(), &server);
    assert!(saved_config(home.path()).contains("stored-key"));

    let mut cmd = ventwatch_cmd(home.path());
    cmd.args(["watch", "--interval", "1"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Session revoked"));
    let saved = saved_config(home.path());
    assert!(!saved.contains("stored-key"), "{saved}");
    assert!(saved.contains(&server.uri()), "{saved}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_keeps_stored_key_when_flag_key_is_revoked() {
    let server = MockServer::start().await;
    mount_unauthorized(&server, 10).await;

    let home = TempDir::new().unwrap();
    plaintext_login(home.path(), &server);

    let mut cmd = ventwatch_cmd(home.path());
    cmd.args(["--api-key", "wrong", "watch", "--interval", "1"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Session revoked"));
    assert!(saved_config(home.path()).contains("stored-key"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_verifies_then_profile_is_used() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    let api_url = format!("{}/api/", server.uri());

    let home = TempDir::new().unwrap();
    let mut login = ventwatch_cmd(home.path());
    login.args([
        "--api-url",
        &api_url,
        "--api-key",
        "k-123",
        "login",
        "--plaintext",
    ]);
    let output = run(login).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    // No flags: URL and key come from the saved profile.
    let mut status = ventwatch_cmd(home.path());
    status.args(["-o", "json", "status"]);
    let output = run(status).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["device_id"], "esp32-vent-01");
}

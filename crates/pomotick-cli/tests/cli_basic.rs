//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Each test
//! points `POMOTICK_CONFIG_DIR` at its own temporary directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (code, stdout, stderr).
fn run_cli(config_dir: &Path, args: &[&str], stdin: Option<&str>) -> (i32, String, String) {
    let mut child = Command::new("cargo")
        .args(["run", "-q", "-p", "pomotick-cli", "--"])
        .args(args)
        .env("POMOTICK_CONFIG_DIR", config_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    {
        let mut pipe = child.stdin.take().expect("stdin is piped");
        if let Some(input) = stdin {
            pipe.write_all(input.as_bytes()).expect("Failed to write stdin");
        }
    }

    let output = child.wait_with_output().expect("Failed to wait for CLI");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

#[test]
fn test_config_get_default() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.work_duration"], None);
    assert_eq!(code, 0, "Config get failed");
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_config_set_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["config", "set", "timer.short_break_duration", "7"], None);
    assert_eq!(code, 0, "Config set failed");
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.short_break_duration"], None);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "7");
}

#[test]
fn test_config_set_rejects_zero_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(
        dir.path(),
        &["config", "set", "timer.sessions_before_long_break", "0"],
        None,
    );
    assert_ne!(code, 0, "Config set unexpectedly accepted 0");
    assert!(stderr.contains("sessions_before_long_break"));
}

#[test]
fn test_config_get_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["config", "get", "timer.nope"], None);
    assert_ne!(code, 0);
}

#[test]
fn test_config_list() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "list"], None);
    assert_eq!(code, 0, "Config list failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["timer"]["sessions_before_long_break"], 4);
}

#[test]
fn test_simulate_json() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["simulate", "--sessions", "8", "--json"], None);
    assert_eq!(code, 0, "Simulate failed");
    let steps: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let steps = steps.as_array().unwrap();
    assert_eq!(steps.len(), 8);
    assert_eq!(steps[0]["session"], "work");
    assert_eq!(steps[0]["duration"], "25:00");
    assert_eq!(steps[1]["session"], "shortBreak");
    assert_eq!(steps[7]["session"], "longBreak");
}

#[test]
fn test_simulate_with_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        dir.path(),
        &["simulate", "--sessions", "2", "--long-break-every", "1", "--json"],
        None,
    );
    assert_eq!(code, 0);
    let steps: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(steps[0]["next_session"], "longBreak");
}

#[test]
fn test_run_reports_state() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["run"], Some("status\nquit\n"));
    assert_eq!(code, 0, "Run failed");
    let state: serde_json::Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert_eq!(state["currentSession"], "work");
    assert_eq!(state["formattedTime"], "25:00");
    assert_eq!(state["isRunning"], false);
}

#[test]
fn test_run_accepts_json_commands() {
    let dir = tempfile::tempdir().unwrap();
    let input = concat!(
        r#"{"action":"start"}"#,
        "\n",
        r#"{"action":"updateSettings","settings":{"workDuration":40,"shortBreakDuration":5,"longBreakDuration":15,"sessionsBeforeLongBreak":4,"autoStartBreaks":false,"autoStartWork":false}}"#,
        "\n",
        r#"{"action":"getState"}"#,
        "\n",
        "quit\n"
    );
    let (code, stdout, _) = run_cli(dir.path(), &["run"], Some(input));
    assert_eq!(code, 0, "Run failed");
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["success"], true);
    assert_eq!(lines[1]["success"], true);
    assert_eq!(lines[2]["timeLeft"], 2400);
    assert_eq!(lines[2]["isRunning"], false);
}

#[test]
fn test_run_rejects_invalid_override() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["run", "--work", "0"], Some("quit\n"));
    assert_ne!(code, 0);
}

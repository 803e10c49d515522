//! Binary tests: argument handling, early failures and exit codes.
//!
//! None of these reach the network; every failure happens before a
//! connection is attempted.

#![allow(clippy::expect_used)]

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn quiet_config() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp config");
    writeln!(file, "log_enabled = false").expect("write config");
    file
}

fn devrun(args: &[&str]) -> Output {
    let config = quiet_config();
    Command::new(env!("CARGO_BIN_EXE_devrun"))
        .arg("--config")
        .arg(config.path())
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("run devrun")
}

/// Test: `--version` prints the package name.
#[test]
fn test_cli_version() {
    let output = devrun(&["--version"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("devrun"), "Should contain 'devrun': {}", stdout);
    assert!(output.status.success());
}

/// Test: `--help` warns that host keys are not verified.
#[test]
fn test_cli_help_mentions_host_keys() {
    let output = devrun(&["--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Host keys are NOT verified"), "{}", stdout);
    assert!(stdout.contains("--uselist"));
    assert!(output.status.success());
}

#[test]
fn test_cli_invalid_device_fails_before_prompting() {
    let output = devrun(&["-d", "10.0.0.256"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr.contains("'10.0.0.256' does not appear to be an IPv4 address"),
        "{}",
        stderr
    );
    assert!(!stderr.contains("Provide username"), "{}", stderr);
}

#[test]
fn test_cli_missing_device_list_fails() {
    let dir = tempfile::tempdir().expect("temp dir");
    let list = dir.path().join("device-list.txt");
    let list = list.to_str().expect("utf8 path");

    let output = devrun(&["-l", "--list-file", list]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("Device list not found"), "{}", stderr);
}

#[test]
fn test_cli_device_and_list_conflict() {
    let output = devrun(&["-d", "10.0.0.1", "-l"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("cannot be used with"), "{}", stderr);
}

#[test]
fn test_cli_rejects_zero_buffer_size() {
    let output = devrun(&["-d", "10.0.0.1", "--buffer-size", "0"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_rejects_zero_timeout() {
    let output = devrun(&["-d", "10.0.0.1", "--timeout", "0"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("greater than 0"), "{}", stderr);
}

#[test]
fn test_cli_rejects_oversized_buffer() {
    let output = devrun(&["-d", "10.0.0.1", "--buffer-size", "4294967295"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_rejects_bad_config_value() {
    let mut config = tempfile::NamedTempFile::new().expect("temp config");
    writeln!(config, "port = ssh").expect("write config");

    let output = Command::new(env!("CARGO_BIN_EXE_devrun"))
        .arg("--config")
        .arg(config.path())
        .args(["-d", "10.0.0.1"])
        .stdin(Stdio::null())
        .output()
        .expect("run devrun");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("port"), "{}", stderr);
}

/// Test: end of input at the username prompt is a clean exit.
#[test]
fn test_cli_eof_at_prompt_exits_cleanly() {
    let output = devrun(&["-d", "10.0.0.1"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{}", stderr);
    assert!(stderr.contains("Provide username: "), "{}", stderr);
    assert!(
        stderr.contains("User exited by keyboard interrupt"),
        "{}",
        stderr
    );
}

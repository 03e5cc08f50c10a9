//! Argument parsing and validation, checked through the real binary.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn swarm() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("swarm"));
    cmd.env("NO_COLOR", "1")
        .env("GOROOT", "/tmp/goroot")
        .env("SWARM_GOMOTE", "definitely-not-a-real-gomote")
        .env_remove("RUST_LOG");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_help_flag_shows_help() {
    swarm()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--instances"))
        .stdout(predicate::str::contains("--keep-going"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    swarm()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("swarm"));
}

// --- Environment ---

#[test]
fn test_no_color_accepts_any_conventional_value() {
    for value in ["1", "yes", "", "0"] {
        swarm()
            .env("NO_COLOR", value)
            .arg("linux-amd64")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Error: expected a command"));
    }
}

// --- Argument errors ---

#[test]
fn test_missing_instance_type_is_a_usage_error() {
    swarm()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("INSTANCE_TYPE"));
}

#[test]
fn test_unknown_clean_mode_is_a_usage_error() {
    swarm()
        .args(["--clean", "sometimes", "linux-amd64", "true"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid cleanup mode"));
}

#[test]
fn test_missing_command_fails() {
    swarm()
        .arg("linux-amd64")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: expected a command"));
}

#[test]
fn test_malformed_env_fails() {
    swarm()
        .args(["-e", "NOEQUALS", "linux-amd64", "true"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: invalid environment variable"));
}

#[test]
fn test_bad_pattern_fails() {
    swarm()
        .args(["--match", "(unclosed", "linux-amd64", "true"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: compiling regexp"));
}

#[test]
fn test_zero_instances_fails() {
    swarm()
        .args(["-i", "0", "linux-amd64", "true"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("at least 1"));
}

#[test]
fn test_unreachable_backend_fails() {
    swarm()
        .args(["-i", "1", "linux-amd64", "true"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: listing instance types"));
}

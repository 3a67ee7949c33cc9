//! CLI smoke tests: run the compiled binary against temporary directories.
//!
//! Every invocation gets its own `HOME` so the user's `~/.muster/config.json`
//! never leaks into the results.

use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Helper: run muster with given args and return (exit_code, stdout, stderr).
fn run_cli_in(home: &Path, args: &[&str]) -> (i32, String, String) {
    let bin = env!("CARGO_BIN_EXE_muster");
    let output = Command::new(bin)
        .args(args)
        .env("HOME", home)
        .env("RUST_LOG", "") // suppress tracing noise
        .output()
        .expect("failed to execute muster binary");
    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

fn run_cli(args: &[&str]) -> (i32, String, String) {
    let home = tempdir().unwrap();
    run_cli_in(home.path(), args)
}

// ============================================================================
// Help & Version
// ============================================================================

#[test]
fn cli_no_args_shows_help() {
    let (code, stdout, _stderr) = run_cli(&[]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("muster"));
}

#[test]
fn cli_help_lists_commands() {
    let (code, stdout, _stderr) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    for cmd in ["watch", "pack", "unpack", "vendor", "config"] {
        assert!(stdout.contains(cmd), "missing {} in help: {}", cmd, stdout);
    }
}

#[test]
fn cli_version_flag() {
    let (code, stdout, _stderr) = run_cli(&["--version"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("muster"));
    assert!(stdout.contains('.'));
}

#[test]
fn cli_invalid_command() {
    let (code, _stdout, stderr) = run_cli(&["nonexistent-command"]);
    assert_ne!(code, 0);
    assert!(
        stderr.contains("error") || stderr.contains("unrecognized"),
        "Expected error message for invalid command, got stderr: {}",
        stderr
    );
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn cli_config_check_without_file() {
    let (code, stdout, _stderr) = run_cli(&["config", "check"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Config file:"));
    assert!(stdout.contains("No config file found"));
}

#[test]
fn cli_config_check_reports_unknown_field() {
    let home = tempdir().unwrap();
    let dir = home.path().join(".muster");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.json"), r#"{"watcher": {"debounce": 10}}"#).unwrap();

    let (code, stdout, _stderr) = run_cli_in(home.path(), &["config", "check"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("[ERROR] watcher.debounce"), "got: {}", stdout);
    assert!(stdout.contains("debounce_ms"), "expected suggestion, got: {}", stdout);
}

#[test]
fn cli_config_show_prints_defaults() {
    let (code, stdout, _stderr) = run_cli(&["config", "show"]);
    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["watcher"]["queue_capacity"], 32);
    assert_eq!(value["vendor"]["binary"], "go");
}

// ============================================================================
// Pack / Unpack
// ============================================================================

#[test]
fn cli_pack_then_unpack() {
    let src = tempdir().unwrap();
    std::fs::write(src.path().join("main.go"), "package main\n").unwrap();
    std::fs::write(src.path().join("go.mod"), "module app\n").unwrap();
    std::fs::write(src.path().join("README.md"), "skip me\n").unwrap();

    let out = tempdir().unwrap();
    let archive = out.path().join("src.tar");
    let restored = out.path().join("restored");

    let (code, stdout, stderr) = run_cli(&[
        "pack",
        src.path().to_str().unwrap(),
        "-o",
        archive.to_str().unwrap(),
    ]);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert!(stdout.contains("2 files"), "got: {}", stdout);
    assert!(archive.exists());

    let (code, _stdout, stderr) = run_cli(&[
        "unpack",
        archive.to_str().unwrap(),
        restored.to_str().unwrap(),
    ]);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert_eq!(
        std::fs::read_to_string(restored.join("main.go")).unwrap(),
        "package main\n"
    );
    assert!(!restored.join("README.md").exists());
}

#[test]
fn cli_pack_missing_dir_fails() {
    let out = tempdir().unwrap();
    let (code, _stdout, stderr) = run_cli(&[
        "pack",
        out.path().join("nope").to_str().unwrap(),
        "-o",
        out.path().join("x.tar").to_str().unwrap(),
    ]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Failed to pack"), "got: {}", stderr);
}

#[test]
fn cli_watch_missing_dir_fails() {
    let out = tempdir().unwrap();
    let (code, _stdout, stderr) = run_cli(&["watch", out.path().join("nope").to_str().unwrap()]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Failed to watch"), "got: {}", stderr);
}

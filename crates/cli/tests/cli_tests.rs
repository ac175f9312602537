//! CLI integration tests

use std::process::{Command, Output};

fn ipd(args: &[&str]) -> Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "ipd-cli", "--"])
        .args(args)
        .env_remove("IPD_NAMESPACE")
        .env_remove("IPD_OUTPUT")
        .env_remove("IPD_TIMEOUT")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = ipd(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Image Pull Doctor"), "Should show app name");
    assert!(stdout.contains("analyze"), "Should show analyze command");
    assert!(stdout.contains("check"), "Should show check command");
    assert!(stdout.contains("version"), "Should show version command");
    assert!(
        stdout.contains("--kubeconfig"),
        "Should show kubeconfig option"
    );
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = ipd(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("ipd"), "Should show binary name");
}

/// Test the version subcommand
#[test]
fn test_version_command() {
    let output = ipd(&["version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Version command should succeed");
    assert!(stdout.starts_with("ipd "), "Should print binary name");
}

/// Test analyze imagepullbackoff subcommand help
#[test]
fn test_analyze_help() {
    let output = ipd(&["analyze", "imagepullbackoff", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Analyze help should succeed");
    assert!(
        stdout.contains("--namespace"),
        "Should show namespace option"
    );
    assert!(stdout.contains("--output"), "Should show output option");
    assert!(stdout.contains("--timeout"), "Should show timeout option");
    assert!(stdout.contains("--audit"), "Should show audit option");
}

/// Test check command help
#[test]
fn test_check_help() {
    let output = ipd(&["check", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Check help should succeed");
    assert!(
        stdout.contains("--all-namespaces"),
        "Should show all-namespaces option"
    );
    assert!(
        stdout.contains("--namespace"),
        "Should show namespace option"
    );
}

/// Invalid names are rejected before any cluster access
#[test]
fn test_invalid_namespace_exit_code() {
    let output = ipd(&[
        "analyze",
        "imagepullbackoff",
        "web",
        "--namespace",
        "Bad_Namespace",
    ]);

    assert_eq!(output.status.code(), Some(5), "Invalid input exits with 5");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("namespace"), "Should name the bad field");
}

/// Test invalid output format error handling
#[test]
fn test_invalid_output_format() {
    let output = ipd(&["analyze", "imagepullbackoff", "web", "-o", "xml"]);

    assert!(!output.status.success(), "Unknown format should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("xml"), "Should mention the rejected value");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = ipd(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}

/// Test missing required argument error handling
#[test]
fn test_missing_pod_argument() {
    let output = ipd(&["analyze", "imagepullbackoff"]);

    assert!(!output.status.success(), "Missing argument should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("required") || stderr.contains("error"),
        "Should show error about missing argument"
    );
}

use std::fs;
use std::process::{Command, Output};

fn capstan(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_capstan"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run capstan")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_list_shows_marked_entries_only() {
    let output = capstan(&["list"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("echo-args"));
    assert!(out.contains("Print every argument received."));
    assert!(out.contains("greet"));
    assert!(!out.contains("helper"));
}

#[test]
fn test_run_collects_unknown_flags_and_residuals() {
    let output = capstan(&["run", "echo-args", "--foo=1", "--che=oh_yeah", "awesome"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("bar = 0"));
    assert!(out.contains("positional = [1, awesome]"));
    assert!(out.contains("extra che = oh_yeah"));
}

#[test]
fn test_run_missing_required_is_usage_error() {
    let output = capstan(&["run", "echo-args"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--foo"));
}

#[test]
fn test_run_flags_and_short_alias() {
    let output = capstan(&["run", "greet", "-n", "capstan", "--shout"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "HELLO, CAPSTAN!");
}

#[test]
fn test_run_repeated_typed_flag() {
    let output = capstan(&["run", "sum", "--n=5", "--n=6"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "11");

    let output = capstan(&["run", "sum", "--n=five"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_run_return_value_is_exit_code() {
    let output = capstan(&["run", "exit-with", "--code=3"]);
    assert_eq!(output.status.code(), Some(3));

    let output = capstan(&["run", "exit-with", "--code=0"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_run_handler_error_is_reported() {
    let output = capstan(&["run", "fail"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error: boom_error"));
}

#[test]
fn test_run_script_help() {
    let output = capstan(&["run", "greet", "--help"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("Say hello."));
    assert!(out.contains("--name"));
    assert!(out.contains("who to greet"));
}

#[test]
fn test_run_unknown_entry_fails() {
    let output = capstan(&["run", "nope"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("No entry point named 'nope'"));

    let output = capstan(&["run", "helper"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not marked as a script"));
}

#[test]
fn test_describe_json() {
    let output = capstan(&["describe", "echo-args"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).expect("invalid json");
    assert_eq!(schema["name"], "echo-args");
    assert_eq!(schema["allow_unknown"], true);

    let arguments = schema["arguments"].as_array().expect("arguments array");
    let names: Vec<&str> = arguments.iter().filter_map(|a| a["name"].as_str()).collect();
    assert_eq!(names, vec!["foo", "bar", "args", "kwargs"]);
    assert_eq!(arguments[0]["required"], true);
    assert_eq!(arguments[1]["default"]["value"], 0);
}

#[test]
fn test_describe_yaml() {
    let output = capstan(&["describe", "exit-with", "--format", "yaml"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("name: exit-with"));
    assert!(out.contains("--code"));
}

#[test]
fn test_config_file_changes_flag_derivation() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("capstan.yaml");
    fs::write(&path, "dash_flags: false\nshow_defaults: false\n").expect("failed to write config");
    let config = path.to_string_lossy().into_owned();

    let output = capstan(&["--config", &config, "describe", "echo-args"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("--foo"));

    let output = capstan(&["--config", "/nonexistent/capstan.yaml", "list"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Failed to load config"));
}

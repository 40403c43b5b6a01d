//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command with `URGENCY_HOME` pointed at `home` and return output.
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_urgency-cli"))
        .env("URGENCY_HOME", home)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_ok(home: &Path, args: &[&str]) -> String {
    let (code, stdout, stderr) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed: {:?}\n{}", args, stderr);
    stdout
}

#[test]
fn test_task_add_and_list() {
    let home = tempfile::tempdir().unwrap();
    let out = run_ok(home.path(), &["task", "add", "Write tests", "--id", "t1", "--priority", "A"]);
    assert!(out.contains("Task created: t1"));

    let list = run_ok(home.path(), &["task", "list"]);
    let parsed: serde_json::Value = serde_json::from_str(&list).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);
    assert_eq!(parsed[0]["priority"], "A");
}

#[test]
fn test_explain_prints_breakdown_table() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["task", "add", "Prerequisite", "--id", "b1"]);
    run_ok(
        home.path(),
        &[
            "task", "add", "Port parser", "--id", "t1", "--priority", "A",
            "--deadline", "2024-06-01", "--created", "2024-06-15",
            "--tags", "Perl", "--blocked-by", "b1",
        ],
    );

    let out = run_ok(
        home.path(),
        &["urgency", "explain", "t1", "--at", "2024-06-15T12:00:00Z"],
    );
    assert!(out.contains("| Priority | 1.0 | 6.00 (A) | 6.00 |"));
    assert!(out.contains("| Blocking b1 | 2.00 | 1.0 | 2.00 |"));
    assert!(out.contains("| Total | | | 21.00 |"));
}

#[test]
fn test_score_is_cached_until_refresh() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["task", "add", "Task", "--id", "t1", "--priority", "B"]);

    assert_eq!(run_ok(home.path(), &["urgency", "score", "t1"]).trim(), "3.90");
    run_ok(home.path(), &["task", "set", "t1", "--priority", "A"]);
    assert_eq!(run_ok(home.path(), &["urgency", "score", "t1"]).trim(), "3.90");
    assert_eq!(run_ok(home.path(), &["urgency", "refresh", "t1"]).trim(), "6.00");
}

#[test]
fn test_agenda_orders_by_urgency() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["task", "add", "Low", "--id", "low", "--priority", "C"]);
    run_ok(home.path(), &["task", "add", "High", "--id", "high", "--priority", "A"]);
    run_ok(home.path(), &["task", "add", "Finished", "--id", "old", "--priority", "A"]);
    run_ok(home.path(), &["task", "done", "old"]);

    let out = run_ok(home.path(), &["urgency", "agenda", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let ids: Vec<_> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["high", "low"]);
}

#[test]
fn test_unknown_task_fails() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["urgency", "score", "ghost"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Task not found: ghost"));
}

#[test]
fn test_config_set_and_get() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["config", "set", "urgency.tag_scores.waiting", "0.5"]);
    let out = run_ok(home.path(), &["config", "get", "urgency.tag_scores.waiting"]);
    assert_eq!(out.trim(), "0.5");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "urgency.bogus", "1"]);
    assert_ne!(code, 0);
}

#[test]
fn test_corrupt_config_is_reported_by_every_command() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(home.path().join("config.toml"), "[urgency\nbroken").unwrap();

    for args in [
        &["config", "get", "urgency.deadline_coefficient"][..],
        &["config", "list"][..],
        &["task", "list"][..],
    ] {
        let (code, _, stderr) = run_cli(home.path(), args);
        assert_ne!(code, 0, "{:?} should fail", args);
        assert!(stderr.contains("config.toml"), "{:?}: {}", args, stderr);
    }
}

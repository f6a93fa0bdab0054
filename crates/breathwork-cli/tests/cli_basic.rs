//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_breathwork"));
    cmd.env("BREATHWORK_DATA_DIR", dir.path())
        .env("BREATHWORK_LOG", "off");
    cmd
}

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(dir: &TempDir, args: &[&str]) -> (i32, String, String) {
    let output = cli(dir)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");
    split(output)
}

fn split(output: Output) -> (i32, String, String) {
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

/// Run a session fed `input` on stdin and return its event lines.
fn run_session(dir: &TempDir, pattern: &str, input: &str) -> Vec<serde_json::Value> {
    let mut child = cli(dir)
        .args(["run", "--pattern", pattern])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn session");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let (code, stdout, stderr) = split(child.wait_with_output().unwrap());
    assert_eq!(code, 0, "run failed: {stderr}");
    stdout
        .lines()
        .map(|l| serde_json::from_str(l).expect("event lines are JSON"))
        .collect()
}

#[test]
fn test_patterns_lists_presets() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&dir, &["patterns"]);
    assert_eq!(code, 0);
    let patterns: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert!(patterns.iter().any(|p| p["key"] == "4-7-8"));
    assert!(patterns.iter().any(|p| p["name"] == "Box Breathing"));
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&dir, &["config", "get", "default_pattern"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "4-7-8");

    let (code, _, _) = run_cli(&dir, &["config", "set", "engine.frame_ms", "20"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(&dir, &["config", "get", "engine.frame_ms"]);
    assert_eq!(stdout.trim(), "20");
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&dir, &["config", "get", "engine.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_run_session_is_recorded() {
    let dir = TempDir::new().unwrap();
    let events = run_session(&dir, "Box Breathing", "s\nq\n");
    assert_eq!(events.first().unwrap()["type"], "SessionStarted");
    assert_eq!(events.first().unwrap()["label"], "Inhale");
    assert!(events.iter().any(|e| e["type"] == "StateSnapshot"));
    let ended = events.last().unwrap();
    assert_eq!(ended["type"], "SessionEnded");
    assert_eq!(ended["persisted"], true);
    assert_eq!(ended["summary"]["pattern"], "4-4-4-4");

    let (code, stdout, _) = run_cli(&dir, &["history"]);
    assert_eq!(code, 0);
    let history: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(history.len(), 1);

    let (_, stdout, _) = run_cli(&dir, &["stats", "all"]);
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["totalSessions"], 1);
    assert_eq!(stats["currentStreak"], 1);
}

#[test]
fn test_run_unknown_pattern_fails() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&dir, &["run", "--pattern", "no such thing"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown pattern"));
}

#[test]
fn test_stats_week_has_seven_days() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&dir, &["stats", "week"]);
    assert_eq!(code, 0);
    let week: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(week.len(), 7);
}

#[test]
fn test_favorites_lifecycle() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&dir, &["favorites", "add", "Evening", "box breathing"]);
    assert_eq!(code, 0);
    let fav: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(fav["pattern"], "4-4-4-4");
    let id = fav["id"].as_i64().unwrap().to_string();

    let (_, stdout, _) = run_cli(&dir, &["favorites", "list"]);
    let list: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(list.len(), 1);

    assert_eq!(run_cli(&dir, &["favorites", "remove", &id]).0, 0);
    assert_eq!(run_cli(&dir, &["favorites", "remove", &id]).0, 1);
}

#[test]
fn test_run_rejects_out_of_range_minutes() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&dir, &["run", "--minutes", "400000000000000000"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("--minutes"));
    assert_eq!(run_cli(&dir, &["run", "--minutes", "0"]).0, 2);
}

#[test]
fn test_resume_with_bad_phase_is_ignored() {
    let dir = TempDir::new().unwrap();
    let events = run_session(&dir, "4-7-8", "p\nr x\ns\nq\n");
    assert!(!events.iter().any(|e| e["type"] == "SessionResumed"));
    let snapshot = events
        .iter()
        .find(|e| e["type"] == "StateSnapshot")
        .unwrap();
    assert_eq!(snapshot["activity"], "paused");
}

#[test]
fn test_failed_remote_upload_is_reported() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_cli(&dir, &["config", "set", "persistence.mode", "remote"]).0, 0);
    assert_eq!(
        run_cli(&dir, &["config", "set", "api.base_url", "http://127.0.0.1:9"]).0,
        0
    );

    let events = run_session(&dir, "4-7-8", "q\n");
    let ended = events
        .iter()
        .find(|e| e["type"] == "SessionEnded")
        .unwrap();
    assert_eq!(ended["persisted"], true);
    let settled = events.last().unwrap();
    assert_eq!(settled["type"], "UploadsSettled");
    assert_eq!(settled["uploaded"], 0);
    assert_eq!(settled["failed"], 1);
}

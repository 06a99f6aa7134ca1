//! The binary end to end: configuration commands, replay and the stdio loop.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::{json, Value};

const SCREEN: &str = r#"{
  "package": "com.example.notes",
  "root": {
    "class": "android.widget.FrameLayout",
    "bounds": [0, 0, 720, 1280],
    "children": [
      {"class": "android.widget.EditText", "resource-id": "com.example.notes:id/title",
       "text": "Groceries", "bounds": [0, 0, 720, 120]},
      {"class": "android.widget.Button", "content-desc": "save", "text": "Save",
       "bounds": [520, 1160, 720, 1280], "clickable": true}
    ]
  }
}"#;

fn agent(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("uiauto-agent").unwrap();
    cmd.env_remove("RUST_LOG").arg("--config").arg(config);
    cmd
}

fn envelopes(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn config_path_and_validate() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");

    let output = agent(&config).args(["config", "path"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        config.display().to_string()
    );

    let output = agent(&config).args(["config", "validate"]).output().unwrap();
    assert!(output.status.success());

    fs::write(&config, "agent:\n  long_press_ms: 0\n").unwrap();
    let output = agent(&config).args(["config", "validate"]).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn config_show_prints_effective_settings() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    fs::write(&config, "agent:\n  app_package: com.example.notes\n").unwrap();
    let output = agent(&config).args(["config", "show"]).output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("app_package: com.example.notes"));
    assert!(text.contains("swipe_steps_per_sec: 28"));
}

#[test]
fn replay_runs_a_script_against_a_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    let screen = dir.path().join("screen.json");
    let script = dir.path().join("script.json");
    fs::write(&screen, SCREEN).unwrap();
    fs::write(
        &script,
        json!([
            {"action": "find", "params": {"strategy": "id", "selector": "com.example.notes:id/title"}},
            {"action": "element:getText", "elementId": "$last"},
            {"action": "find", "params": {"strategy": "accessibility id", "selector": "save"}},
            {"action": "element:click", "elementId": "$last"},
            {"action": "find", "params": {"strategy": "name", "selector": "missing"}}
        ])
        .to_string(),
    )
    .unwrap();

    let output = agent(&config)
        .arg("replay")
        .arg(&script)
        .arg("--screen")
        .arg(&screen)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let replies = envelopes(&output.stdout);
    assert_eq!(replies.len(), 5);
    assert_eq!(replies[1], json!({"status": 0, "value": "Groceries"}));
    assert_eq!(replies[3], json!({"status": 0, "value": true}));
    assert_eq!(replies[4]["status"], 7);
}

#[test]
fn serve_answers_stdin_line_by_line() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    let screen = dir.path().join("screen.json");
    fs::write(&screen, SCREEN).unwrap();
    fs::write(
        &config,
        format!("screen: {}\nlogging:\n  format: json\n", screen.display()),
    )
    .unwrap();

    let input = [
        json!({"action": "getDeviceSize"}).to_string(),
        json!({"action": "orientation", "params": {"orientation": "LANDSCAPE"}}).to_string(),
        json!({"action": "getDeviceSize"}).to_string(),
    ]
    .join("\n");
    let output = agent(&config).arg("serve").write_stdin(input).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let replies = envelopes(&output.stdout);
    assert_eq!(replies[0]["value"], json!({"width": 720, "height": 1280}));
    assert_eq!(replies[1]["value"], "LANDSCAPE");
    assert_eq!(replies[2]["value"], json!({"width": 1280, "height": 720}));
}

#[test]
fn serve_without_a_screen_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    let output = agent(&config).arg("serve").write_stdin("").output().unwrap();
    assert!(!output.status.success());
}

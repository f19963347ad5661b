use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

const CONFIG: &str = r#"
[workflow]
name = "cli-test"
max_workers = 2
batch_size = 2

[logging]
level = "warn"
ansi = false

[[workers]]
kind = "reply"
name = "b"
text = "pong"

[[workers]]
kind = "shell"
name = "a"
program = "sh"
args = ["-c", "exit 3"]
"#;

fn erysa(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_erysa"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn summary(output: &Output) -> Value {
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_run_prints_partial_summary() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, CONFIG).unwrap();

    let summary = summary(&erysa(&config, &["run", "ping"]));

    assert_eq!(summary["workflow"], "cli-test");
    assert_eq!(summary["mode"], "run");
    assert_eq!(summary["status"], "partial");
    assert_eq!(summary["succeeded"], 1);
    assert_eq!(summary["failed"], 1);
    assert_eq!(summary["results"].as_array().unwrap().len(), 2);
}

#[test]
fn test_batch_and_concurrent_read_task_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, CONFIG).unwrap();
    let tasks = dir.path().join("tasks.txt");
    std::fs::write(&tasks, "one\ntwo\nthree\n").unwrap();
    let tasks = tasks.to_str().unwrap();

    let batch = summary(&erysa(&config, &["batch", "--tasks", tasks]));
    assert_eq!(batch["mode"], "batched_run");
    // Three tasks on two workers
    assert_eq!(batch["results"].as_array().unwrap().len(), 6);
    assert_eq!(batch["results"][0]["worker"], "b");
    assert_eq!(batch["results"][1]["worker"], "a");

    let concurrent = summary(&erysa(&config, &["concurrent", "--tasks", tasks]));
    assert_eq!(concurrent["mode"], "concurrent_run");
    assert_eq!(concurrent["results"].as_array().unwrap().len(), 3);
}

#[test]
fn test_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, CONFIG).unwrap();
    let out = dir.path().join("results.json");

    let output = erysa(&config, &["async-run", "ping", "--output", out.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["mode"], "async_run");
    assert_eq!(written["results"].as_array().unwrap().len(), 2);
}

#[test]
fn test_configuration_source_is_logged() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, CONFIG).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_erysa"))
        .arg("--config")
        .arg(&config)
        .args(["async-run", "ping"])
        .env("RUST_LOG", "info")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Loaded configuration from"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_config_file_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, CONFIG.replace("batch_size = 2", "batch_size = 0")).unwrap();

    let output = erysa(&config, &["async-run", "ping"]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_zero_batch_size_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, CONFIG).unwrap();
    let tasks = dir.path().join("tasks.txt");
    std::fs::write(&tasks, "one\n").unwrap();

    let output = erysa(&config, &["batch", "--tasks", tasks.to_str().unwrap(), "--batch-size", "0"]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

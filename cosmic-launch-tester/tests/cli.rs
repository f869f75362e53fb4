use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "cosmic-launch-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_cosmic-launch-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("forced-win"));
}

#[test]
fn cli_runs_forced_win_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_cosmic-launch-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "forced-win,forced-loss",
            "--iterations",
            "1",
            "--seeds",
            "1,0x2a",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cosmic Launch Automated Tester"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let parsed: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let results = parsed.as_array().expect("array of results");
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r["passed"] == true));
    assert_eq!(results[1]["seed"], 42);
}

#[test]
fn cli_rejects_unknown_report_format() {
    let exe = env!("CARGO_BIN_EXE_cosmic-launch-tester");
    let output = Command::new(exe)
        .args(["--report", "yaml"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
}

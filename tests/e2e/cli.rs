//! E2E tests for the `multistage` binary

use super::helpers::{unreachable_status_url, LaneFixture, StageFixture};
use std::process::{Command, Output};

fn multistage(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_multistage"))
        .args(args)
        .env("MULTISTAGE_LOG", "warn")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to run multistage")
}

fn two_stage_fixture(second_stage_script: &'static str) -> LaneFixture {
    LaneFixture::new(
        &unreachable_status_url().unwrap(),
        &[
            StageFixture::new("v1", 10, "exit 0"),
            StageFixture::new("v2", 20, second_stage_script),
        ],
    )
    .unwrap()
}

#[test]
fn test_lanes_lists_document() {
    let fixture = two_stage_fixture("exit 0");
    let config = fixture.write_json().unwrap();

    let output = multistage(&["lanes", "--config", config.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("main"));
    assert!(stdout.contains("v1"));
    assert!(stdout.contains("until epoch 20"));
}

#[test]
fn test_lanes_rejects_invalid_document() {
    let fixture = two_stage_fixture("exit 0");
    let config = fixture.temp.path().join("broken.json");
    std::fs::write(&config, r#"{"lanes": [{"name": "main"}]}"#).unwrap();

    let output = multistage(&["lanes", "--config", config.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("for lane 'main', 'workingDirectory' is required"));
}

#[test]
fn test_run_completes_lane() {
    let fixture = two_stage_fixture("exit 0");
    let config = fixture.write_json().unwrap();

    let output = multistage(&[
        "run",
        "--config",
        config.to_str().unwrap(),
        "--lane",
        "main",
        "--stage",
        "v1",
        "--poll-interval",
        "1",
    ]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(fixture.started("v1"));
    assert!(fixture.started("v2"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Lane main completed"));
}

#[test]
fn test_run_exits_with_failure_when_node_fails() {
    let fixture = two_stage_fixture("exit 2");
    let config = fixture.write_json().unwrap();

    let output = multistage(&[
        "run",
        "--config",
        config.to_str().unwrap(),
        "--lane",
        "main",
        "--stage",
        "v2",
        "--poll-interval",
        "1",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!fixture.started("v1"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("halted at stage v2"));
}

#[test]
fn test_run_unknown_stage_starts_nothing() {
    let fixture = two_stage_fixture("exit 0");
    let config = fixture.write_json().unwrap();

    let output = multistage(&[
        "run",
        "--config",
        config.to_str().unwrap(),
        "--lane",
        "main",
        "--stage",
        "v3",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown stage 'v3'"));
    assert!(!fixture.working_directory().exists());
}

#[test]
fn test_run_unknown_lane_starts_nothing() {
    let fixture = two_stage_fixture("exit 0");
    let config = fixture.write_json().unwrap();

    let output = multistage(&[
        "run",
        "--config",
        config.to_str().unwrap(),
        "--lane",
        "side",
        "--stage",
        "v1",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown lane: 'side'"));
    assert!(!fixture.working_directory().exists());
}

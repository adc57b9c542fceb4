//! E2E tests for running lanes through the library API
//!
//! Each test builds a lane of fake nodes (shell scripts) with zip config
//! archives and a local status endpoint, then runs it with a short polling
//! interval.

use super::helpers::{
    status_server, unreachable_status_url, LaneFixture, StageFixture, RUN_FOREVER,
};
use multistage::config::LaneSet;
use multistage::lane::{LaneOutcome, LaneSequencer};
use multistage::shutdown::ShutdownSignal;
use multistage::stage::{StageOutcome, StageSettings};
use std::fs;
use std::time::Duration;

fn fast_settings() -> StageSettings {
    StageSettings {
        poll_interval: Duration::from_millis(100),
        status_timeout: Duration::from_secs(2),
        ..StageSettings::default()
    }
}

/// Lane [s1(10), s2(20)]: the endpoint reports epoch 5 twice and then 11, so
/// s1 is killed on the third poll and s2 is configured and started.
#[test]
fn test_epoch_boundary_advances_to_next_stage() {
    let server = status_server(|index| if index < 2 { 5 } else { 11 });
    let fixture = LaneFixture::new(
        &server.url("/node/status"),
        &[
            StageFixture::new("s1", 10, RUN_FOREVER),
            StageFixture::new("s2", 20, "exit 0"),
        ],
    )
    .unwrap();
    let lanes = LaneSet::load(&fixture.write_json().unwrap()).unwrap();
    let lane = lanes.lane("main").unwrap();

    let report = LaneSequencer::new(lane, fast_settings(), ShutdownSignal::new())
        .run_from("s1")
        .unwrap();

    assert_eq!(report.outcome, LaneOutcome::Completed);
    assert_eq!(report.stages.len(), 2);
    assert_eq!(report.stages[0].outcome, StageOutcome::Killed);
    assert_eq!(report.stages[0].stop_requests, 1);
    assert_eq!(report.stages[1].outcome, StageOutcome::Completed);
    assert!(server.hits() >= 3);

    assert!(fixture.started("s1"));
    assert!(fixture.started("s2"));
    let work = fixture.working_directory();
    assert_eq!(fs::read_to_string(work.join("s1.seen-config")).unwrap(), "s1");
    assert_eq!(fs::read_to_string(work.join("s2.seen-config")).unwrap(), "s2");
    assert_eq!(
        fs::read_to_string(work.join("config/stage.txt")).unwrap(),
        "s2"
    );
}

#[test]
fn test_node_failure_halts_lane() {
    let fixture = LaneFixture::new(
        &unreachable_status_url().unwrap(),
        &[
            StageFixture::new("s1", 10, "exit 0"),
            StageFixture::new("s2", 20, "exit 7"),
            StageFixture::new("s3", 30, "exit 0"),
        ],
    )
    .unwrap();
    let lanes = LaneSet::load(&fixture.write_json().unwrap()).unwrap();

    let report = LaneSequencer::new(
        lanes.lane("main").unwrap(),
        fast_settings(),
        ShutdownSignal::new(),
    )
    .run_from("s1")
    .unwrap();

    assert_eq!(
        report.outcome,
        LaneOutcome::Halted {
            stage: "s2".to_string(),
            outcome: StageOutcome::Failed {
                code: Some(7),
                signal: None,
            },
        }
    );
    assert!(fixture.started("s2"));
    assert!(!fixture.started("s3"));
}

#[test]
fn test_yaml_document_runs_from_middle_stage() {
    let fixture = LaneFixture::new(
        &unreachable_status_url().unwrap(),
        &[
            StageFixture::new("s1", 10, "exit 0"),
            StageFixture::new("s2", 20, "exit 0"),
        ],
    )
    .unwrap();
    let lanes = LaneSet::load(&fixture.write_yaml().unwrap()).unwrap();

    let report = LaneSequencer::new(
        lanes.lane("main").unwrap(),
        fast_settings(),
        ShutdownSignal::new(),
    )
    .run_from("s2")
    .unwrap();

    assert_eq!(report.outcome, LaneOutcome::Completed);
    assert!(!fixture.started("s1"));
    assert!(fixture.started("s2"));
    assert_eq!(
        fs::read_to_string(fixture.working_directory().join("s2.args"))
            .unwrap()
            .trim(),
        "--log-save --profile-mode"
    );
}

#[test]
fn test_interrupt_ends_lane_without_failure() {
    let fixture = LaneFixture::new(
        &unreachable_status_url().unwrap(),
        &[
            StageFixture::new("s1", 10, RUN_FOREVER),
            StageFixture::new("s2", 20, "exit 0"),
        ],
    )
    .unwrap();
    let lanes = LaneSet::load(&fixture.write_json().unwrap()).unwrap();
    let shutdown = ShutdownSignal::new();
    let trigger = shutdown.clone();

    let report = std::thread::scope(|scope| {
        scope.spawn(move || {
            std::thread::sleep(Duration::from_millis(500));
            trigger.trigger();
        });
        LaneSequencer::new(lanes.lane("main").unwrap(), fast_settings(), shutdown)
            .run_from("s1")
            .unwrap()
    });

    assert_eq!(report.outcome, LaneOutcome::Interrupted);
    assert!(!report.outcome.is_failure());
    assert!(!fixture.started("s2"));
}

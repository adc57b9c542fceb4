//! Lane sequencer
//!
//! Runs the stages of one lane in order, starting from an operator-chosen
//! stage, and decides after each stage whether the lane moves on.

mod lock;


use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use crate::config::Lane;
use crate::shutdown::ShutdownSignal;
use crate::stage::{StageOutcome, StageRunner, StageSettings};

pub use lock::LaneLock;

/// How a lane run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaneOutcome {
    /// Every stage of the sub-list ran and allowed the lane to continue
    Completed,
    /// A stage's node failed; later stages were not started
    Halted { stage: String, outcome: StageOutcome },
    /// The operator interrupted the run
    Interrupted,
}

impl LaneOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Halted { .. })
    }
}

/// One stage that was started during a lane run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSummary {
    pub name: String,
    pub outcome: StageOutcome,
    pub stop_requests: u32,
}

/// Result of [`LaneSequencer::run_from`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneReport {
    pub lane: String,
    pub outcome: LaneOutcome,
    /// Stages in the order they ran
    pub stages: Vec<StageSummary>,
}

impl LaneReport {
    fn new(lane: &Lane) -> Self {
        Self {
            lane: lane.name().to_string(),
            outcome: LaneOutcome::Completed,
            stages: Vec::new(),
        }
    }

    fn finish(mut self, outcome: LaneOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

/// Drives the stages of a single lane
pub struct LaneSequencer<'a> {
    lane: &'a Lane,
    settings: StageSettings,
    shutdown: ShutdownSignal,
}

impl<'a> LaneSequencer<'a> {
    pub fn new(lane: &'a Lane, settings: StageSettings, shutdown: ShutdownSignal) -> Self {
        Self {
            lane,
            settings,
            shutdown,
        }
    }

    /// Run `initial_stage` and every stage after it.
    ///
    /// Configuration, archive and spawn errors abort the lane with an error;
    /// node failures and interrupts are reported through [`LaneOutcome`].
    pub fn run_from(&self, initial_stage: &str) -> Result<LaneReport> {
        let stages = self.lane.stages_from(initial_stage)?;
        let working_directory = self.lane.working_directory();
        let mut report = LaneReport::new(self.lane);

        ensure_directory(working_directory)?;
        let _lock = LaneLock::acquire(working_directory)?;

        for (index, stage) in stages.iter().enumerate() {
            if self.shutdown.is_triggered() {
                tracing::info!(lane = self.lane.name(), "interrupted between stages");
                return Ok(report.finish(LaneOutcome::Interrupted));
            }

            println!(
                "{} Stage {} ({}/{}) until epoch {}",
                "→".cyan().bold(),
                stage.name().bold(),
                index + 1,
                stages.len(),
                stage.until_epoch()
            );

            ensure_directory(working_directory)?;

            let mut runner = StageRunner::new(stage, self.settings)?;
            runner.configure(working_directory)?;
            let stage_report = runner.run(working_directory, &self.shutdown)?;

            report.stages.push(StageSummary {
                name: stage.name().to_string(),
                outcome: stage_report.outcome,
                stop_requests: stage_report.stop_requests,
            });

            match stage_report.outcome {
                StageOutcome::Killed => {
                    tracing::info!(
                        lane = self.lane.name(),
                        stage = stage.name(),
                        "stage reached its epoch boundary"
                    );
                    println!("  {} {}", "✓".green().bold(), stage_report.outcome);
                }
                StageOutcome::Completed => {
                    tracing::warn!(
                        lane = self.lane.name(),
                        stage = stage.name(),
                        until_epoch = stage.until_epoch(),
                        "node exited cleanly before its epoch boundary, continuing"
                    );
                    println!("  {} {}", "⚠".yellow().bold(), stage_report.outcome);
                }
                StageOutcome::Failed { .. } => {
                    tracing::error!(
                        lane = self.lane.name(),
                        stage = stage.name(),
                        exit_code = stage_report.exit_status.and_then(|status| status.code()),
                        "node failed, halting lane"
                    );
                    println!("  {} {}", "✗".red().bold(), stage_report.outcome);
                    return Ok(report.finish(LaneOutcome::Halted {
                        stage: stage.name().to_string(),
                        outcome: stage_report.outcome,
                    }));
                }
                StageOutcome::Interrupted => {
                    println!("  {} {}", "⚠".yellow().bold(), stage_report.outcome);
                    return Ok(report.finish(LaneOutcome::Interrupted));
                }
            }
        }

        Ok(report.finish(LaneOutcome::Completed))
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create working directory {}", path.display()))
}

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::LaneSet;
use crate::lane::{LaneOutcome, LaneReport, LaneSequencer};
use crate::shutdown::ShutdownSignal;
use crate::stage::StageSettings;

/// Run `lane_name` from `stage_name` to the end of the lane
///
/// The lane and stage are resolved before anything is started, so a typo
/// never spawns a node. Ctrl+C stops the current node and ends the run.
pub fn execute(
    config_path: &Path,
    lane_name: &str,
    stage_name: &str,
    settings: StageSettings,
) -> Result<LaneOutcome> {
    let lanes = LaneSet::load(config_path)?;
    let lane = lanes.lane(lane_name)?;
    let stages = lane.stages_from(stage_name)?;

    println!(
        "{} Lane {} from stage {} ({} stage{})",
        "→".cyan().bold(),
        lane.name().bold(),
        stage_name.bold(),
        stages.len(),
        if stages.len() == 1 { "" } else { "s" }
    );
    println!(
        "  {} {}",
        "Working directory:".dimmed(),
        lane.working_directory().display()
    );
    println!("  {} Press {} to stop\n", "→".dimmed(), "Ctrl+C".bold());

    let shutdown = ShutdownSignal::new();
    shutdown.install_handler()?;

    let report = LaneSequencer::new(lane, settings, shutdown).run_from(stage_name)?;
    print_summary(&report);

    Ok(report.outcome)
}

fn print_summary(report: &LaneReport) {
    println!();
    println!("{}", "═".repeat(40).dimmed());

    for stage in &report.stages {
        let mark = if stage.outcome.allows_next_stage() {
            "✓".green().bold()
        } else {
            "✗".red().bold()
        };
        println!("  {} {} {}", mark, stage.name, stage.outcome.to_string().dimmed());
    }

    match &report.outcome {
        LaneOutcome::Completed => {
            println!(
                "{} Lane {} completed",
                "✓".green().bold(),
                report.lane.bold()
            );
        }
        LaneOutcome::Halted { stage, outcome } => {
            println!(
                "{} Lane {} halted at stage {}: {}",
                "✗".red().bold(),
                report.lane.bold(),
                stage.bold(),
                outcome
            );
        }
        LaneOutcome::Interrupted => {
            println!(
                "{} Lane {} interrupted",
                "⚠".yellow().bold(),
                report.lane.bold()
            );
        }
    }
}

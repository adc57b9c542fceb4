use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::LaneSet;

/// Validate a lanes document and list its lanes and stages
pub fn execute(config_path: &Path) -> Result<()> {
    let lanes = LaneSet::load(config_path)?;

    println!(
        "{} {} ({} lane{})",
        "✓".green().bold(),
        config_path.display(),
        lanes.lanes().len(),
        if lanes.lanes().len() == 1 { "" } else { "s" }
    );

    for lane in lanes.lanes() {
        println!();
        println!("{}", lane.name().bold());
        println!(
            "  {} {}",
            "Working directory:".dimmed(),
            lane.working_directory().display()
        );
        println!("{}", "─".repeat(40).dimmed());

        for stage in lane.stages() {
            let mut flags = Vec::new();
            if stage.with_db_lookup_extensions() {
                flags.push("db-lookup");
            }
            if stage.with_indexing() {
                flags.push("indexing");
            }

            println!(
                "  {} {} {} {}",
                "•".cyan(),
                stage.name(),
                format!("until epoch {}", stage.until_epoch()).dimmed(),
                if flags.is_empty() {
                    String::new()
                } else {
                    format!("[{}]", flags.join(", ")).yellow().to_string()
                }
            );
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use colored::Colorize;
use multistage::commands::{lanes, run};
use multistage::constants::{DEFAULT_POLL_INTERVAL, DEFAULT_STATUS_TIMEOUT};
use multistage::logging::init_tracing;
use multistage::stage::StageSettings;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "multistage")]
#[command(about = "Run a node through a lane of configuration stages", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a lane, starting from the given stage
    Run {
        /// Path to the lanes document (JSON, YAML or TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Lane to run
        #[arg(short, long)]
        lane: String,

        /// Stage to start from
        #[arg(short, long)]
        stage: String,

        /// Seconds between two node status polls
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
        poll_interval: u64,

        /// Timeout in seconds for a single status poll
        #[arg(long, default_value_t = DEFAULT_STATUS_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
        status_timeout: u64,
    },

    /// Validate a lanes document and list its lanes
    Lanes {
        /// Path to the lanes document (JSON, YAML or TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            lane,
            stage,
            poll_interval,
            status_timeout,
        } => {
            let settings = StageSettings {
                poll_interval: Duration::from_secs(poll_interval),
                status_timeout: Duration::from_secs(status_timeout),
                ..StageSettings::default()
            };
            run::execute(&config, &lane, &stage, settings).map(|outcome| outcome.is_failure())
        }
        Commands::Lanes { config } => lanes::execute(&config).map(|()| false),
    };

    match result {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

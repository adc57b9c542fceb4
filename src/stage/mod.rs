//! Stage runner
//!
//! Runs one stage of a lane: replaces the lane's `config` directory with the
//! stage's configuration archive, starts the node and supervises it until it
//! exits on its own or reports progress past the stage's epoch boundary.
//!
//! While the node runs there are two activities, joined before
//! [`StageRunner::run`] returns:
//! - the process-wait thread, which owns the child and kills it on request
//! - the monitor, on the calling thread, which polls the status endpoint

mod command;
mod outcome;
mod settings;
mod status;
mod wait;


use anyhow::{anyhow, bail, Context, Result};
use std::convert::Infallible;
use std::path::Path;
use std::process::ExitStatus;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use crate::archive;
use crate::config::Stage;
use crate::constants::CONFIG_DIRECTORY_NAME;
use crate::shutdown::ShutdownSignal;

pub use command::{node_arguments, NodeCommand};
pub use outcome::StageOutcome;
pub use settings::StageSettings;
pub use status::{parse_status, NodeProgress, StatusProbe};

use wait::await_exit;

/// Summary of a finished [`StageRunner::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub outcome: StageOutcome,
    /// `None` when the node was never started
    pub exit_status: Option<ExitStatus>,
    /// Number of times the monitor asked for the node to be killed
    pub stop_requests: u32,
}

/// Why the monitor loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MonitorExit {
    ProcessExited,
    BoundaryReached,
    Interrupted,
}

/// Handle on a running node, held by the monitor side
struct NodeHandle {
    pid: u32,
    kill_requests: Sender<()>,
    exited: Receiver<Infallible>,
}

impl NodeHandle {
    fn has_exited(&self) -> bool {
        matches!(self.exited.try_recv(), Err(TryRecvError::Disconnected))
    }
}

/// Runs a single stage of a lane
pub struct StageRunner<'a> {
    stage: &'a Stage,
    settings: StageSettings,
    probe: StatusProbe,
    node: Option<NodeHandle>,
    outcome: Option<StageOutcome>,
    stop_requests: u32,
}

impl<'a> StageRunner<'a> {
    pub fn new(stage: &'a Stage, settings: StageSettings) -> Result<Self> {
        let probe = StatusProbe::new(stage.node_status_url(), settings.status_timeout)?;
        Ok(Self {
            stage,
            settings,
            probe,
            node: None,
            outcome: None,
            stop_requests: 0,
        })
    }

    /// Replace `<working_directory>/config` with the stage's configuration.
    pub fn configure(&self, working_directory: &Path) -> Result<()> {
        let destination = working_directory.join(CONFIG_DIRECTORY_NAME);
        tracing::info!(
            stage = self.stage.name(),
            archive = self.stage.configuration_archive(),
            destination = %destination.display(),
            "configuring stage"
        );

        archive::materialize(self.stage.configuration_archive(), &destination).with_context(
            || {
                format!(
                    "Failed to fetch configuration archive for stage '{}'",
                    self.stage.name()
                )
            },
        )
    }

    /// Start the node and supervise it until it has exited.
    ///
    /// Nothing is spawned when `shutdown` has already been triggered.
    pub fn run(
        &mut self,
        working_directory: &Path,
        shutdown: &ShutdownSignal,
    ) -> Result<StageReport> {
        if self.node.is_some() {
            bail!("Stage '{}' is already running", self.stage.name());
        }

        if shutdown.is_triggered() {
            tracing::info!(stage = self.stage.name(), "interrupted before the node started");
            self.outcome = Some(StageOutcome::Interrupted);
            return Ok(StageReport {
                outcome: StageOutcome::Interrupted,
                exit_status: None,
                stop_requests: self.stop_requests,
            });
        }

        let command =
            NodeCommand::for_stage(self.stage, working_directory, self.settings.open_files_limit);
        tracing::info!(
            stage = self.stage.name(),
            command = %command.display(),
            cwd = %working_directory.display(),
            "starting node"
        );

        let child = command.spawn()?;
        let pid = child.id();
        let (kill_tx, kill_rx) = mpsc::channel();
        let (exited_tx, exited_rx) = mpsc::channel();
        self.node = Some(NodeHandle {
            pid,
            kill_requests: kill_tx,
            exited: exited_rx,
        });
        tracing::debug!(stage = self.stage.name(), pid, "node started");

        let (wait_result, monitor_result) = thread::scope(|scope| {
            let waiter = scope.spawn(move || await_exit(child, kill_rx, exited_tx));
            let monitor_result = self.monitor(shutdown);
            // Dropping the handle disconnects the kill channel, so the waiter
            // cannot outlive a monitor that bailed out early.
            self.node = None;
            (waiter.join(), monitor_result)
        });

        let stage_name = self.stage.name();
        let exit_status = wait_result
            .map_err(|_| anyhow!("Process-wait thread for stage '{stage_name}' panicked"))?
            .with_context(|| format!("Failed to wait for node of stage '{stage_name}'"))?;
        let monitor_exit = monitor_result?;

        let outcome = if monitor_exit == MonitorExit::Interrupted || shutdown.is_triggered() {
            StageOutcome::Interrupted
        } else {
            StageOutcome::from_exit_status(exit_status)
        };

        tracing::info!(
            stage = self.stage.name(),
            pid,
            exit_code = exit_status.code(),
            outcome = %outcome,
            "node stopped"
        );
        self.outcome = Some(outcome);

        Ok(StageReport {
            outcome,
            exit_status: Some(exit_status),
            stop_requests: self.stop_requests,
        })
    }

    /// Outcome of the last run, `None` until the node has been run.
    pub fn outcome(&self) -> Option<StageOutcome> {
        self.outcome
    }

    /// Whether a node is held and has not been observed to exit.
    pub fn is_running(&self) -> bool {
        self.node.as_ref().is_some_and(|node| !node.has_exited())
    }

    /// Query the status endpoint once; true iff progress is past the boundary.
    pub fn should_stop(&self) -> bool {
        let progress = self.probe.current_progress();
        let past_boundary = progress.epoch > self.stage.until_epoch();
        tracing::debug!(
            stage = self.stage.name(),
            epoch = progress.epoch,
            nonce = progress.nonce,
            until_epoch = self.stage.until_epoch(),
            past_boundary,
            "checked node progress"
        );
        past_boundary
    }

    /// Ask the process-wait activity to kill the node and drop the handle.
    pub fn stop(&mut self) -> Result<()> {
        let node = self.node.take().ok_or_else(|| {
            anyhow!(
                "Cannot stop stage '{}': no node is running",
                self.stage.name()
            )
        })?;

        tracing::info!(stage = self.stage.name(), pid = node.pid, "stopping node");
        self.stop_requests += 1;
        if node.kill_requests.send(()).is_err() {
            tracing::debug!(pid = node.pid, "node exited before the stop request");
        }
        Ok(())
    }

    fn monitor(&mut self, shutdown: &ShutdownSignal) -> Result<MonitorExit> {
        loop {
            let interrupted = shutdown.wait_timeout(self.settings.poll_interval);

            if !self.is_running() {
                self.node = None;
                return Ok(MonitorExit::ProcessExited);
            }

            if interrupted {
                self.stop()?;
                return Ok(MonitorExit::Interrupted);
            }

            if self.should_stop() {
                tracing::info!(
                    stage = self.stage.name(),
                    until_epoch = self.stage.until_epoch(),
                    "epoch boundary passed"
                );
                self.stop()?;
                return Ok(MonitorExit::BoundaryReached);
            }
        }
    }
}

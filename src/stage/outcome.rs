//! Terminal outcome of a stage run

use nix::sys::signal::Signal;
use std::fmt;
use std::process::ExitStatus;

/// How a stage's node process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Terminated with SIGKILL after crossing its epoch boundary
    Killed,
    /// Exited on its own with status 0
    Completed,
    /// Any other termination
    Failed {
        code: Option<i32>,
        signal: Option<i32>,
    },
    /// Stopped because the operator interrupted the driver
    Interrupted,
}

impl StageOutcome {
    /// Classify the exit status reported by the operating system.
    pub fn from_exit_status(status: ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        let signal = status.signal();
        if signal == Some(Signal::SIGKILL as i32) {
            return Self::Killed;
        }
        if status.success() {
            return Self::Completed;
        }

        Self::Failed {
            code: status.code(),
            signal,
        }
    }

    /// Whether the lane may move on to the next stage.
    pub fn allows_next_stage(&self) -> bool {
        matches!(self, Self::Killed | Self::Completed)
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Killed => write!(f, "stopped at epoch boundary"),
            Self::Completed => write!(f, "exited cleanly"),
            Self::Failed {
                code: Some(code), ..
            } => write!(f, "node error (exit code {code})"),
            Self::Failed {
                signal: Some(signal),
                ..
            } => write!(f, "node error (signal {signal})"),
            Self::Failed { .. } => write!(f, "node error"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

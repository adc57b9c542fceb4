//! Tunables for supervising a node process

use std::time::Duration;

use crate::constants::{DEFAULT_POLL_INTERVAL, DEFAULT_STATUS_TIMEOUT, NODE_OPEN_FILES_LIMIT};

/// Settings shared by every stage of a lane run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSettings {
    /// Delay between two status queries of the monitor
    pub poll_interval: Duration,
    /// Request timeout of a single status query
    pub status_timeout: Duration,
    /// Soft `RLIMIT_NOFILE` requested for the node
    pub open_files_limit: u64,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
            open_files_limit: NODE_OPEN_FILES_LIMIT,
        }
    }
}

//! Constants shared by the stage runner, the lane sequencer and the CLI.

use std::time::Duration;

/// Name of the node executable expected inside every stage's `bin` directory.
pub const NODE_EXECUTABLE_NAME: &str = "node";

/// Subdirectory of a lane's working directory that each stage replaces.
pub const CONFIG_DIRECTORY_NAME: &str = "config";

/// Lock file guarding a lane's working directory against concurrent drivers.
pub const LANE_LOCK_FILE_NAME: &str = ".multistage.lock";

/// Placeholder in node arguments that is replaced by the home directory.
pub const HOME_PLACEHOLDER: &str = "~";

/// Soft `RLIMIT_NOFILE` requested for the node process (clamped to the hard limit).
pub const NODE_OPEN_FILES_LIMIT: u64 = 1024 * 512;

/// Default interval between two status polls of a running stage.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default timeout for a single status poll.
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the process-wait activity blocks before checking for a kill request.
pub const KILL_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Argument appended when a stage enables database lookup extensions.
pub const DB_LOOKUP_EXTENSIONS_ARG: &str = "--operation-mode=db-lookup-extension";

/// Argument appended when a stage enables indexing.
pub const INDEXING_ARG: &str = "--with-indexing";

/// Metric keys read from `data.metrics` of the node status document.
pub mod metrics {
    /// Progress counter compared against a stage's epoch boundary.
    pub const EPOCH_NUMBER: &str = "drt_epoch_number";

    /// Block nonce, only displayed.
    pub const NONCE: &str = "drt_nonce";
}

/// Prefix of the temporary directories used while materializing archives.
pub const TEMPORARY_DIRECTORIES_PREFIX: &str = ".multistage-staging-";

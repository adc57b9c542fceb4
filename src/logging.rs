//! Diagnostic logging setup

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`EnvFilter` syntax).
pub const LOG_ENV_VAR: &str = "MULTISTAGE_LOG";

const DEFAULT_FILTER: &str = "info";

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Install a stderr subscriber filtered by `MULTISTAGE_LOG`, defaulting to
/// `info`. Calling this more than once is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    let _ = TRACING_INIT.set(());
}

//! Operator interrupt handling
//!
//! Ctrl+C (and SIGTERM/SIGHUP) trigger a [`ShutdownSignal`]. The stage
//! monitor sleeps on the signal between status polls, so an interrupt wakes it
//! immediately instead of after the polling interval.

use anyhow::{Context, Result};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    triggered: Mutex<bool>,
    wakeup: Condvar,
}

/// One-way latch shared between the signal handler and the lane run
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the signal and wake every waiter. Idempotent.
    pub fn trigger(&self) {
        let mut triggered = self.lock();
        *triggered = true;
        self.inner.wakeup.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.lock()
    }

    /// Sleep for up to `timeout`, returning early once the signal is
    /// triggered. Returns whether it was triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .inner
            .wakeup
            .wait_timeout_while(guard, timeout, |triggered| !*triggered)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    /// Route Ctrl+C and termination signals to this latch.
    ///
    /// Can only be installed once per process.
    pub fn install_handler(&self) -> Result<()> {
        let signal = self.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("interrupt received, stopping the lane");
            signal.trigger();
        })
        .context("Failed to set Ctrl+C handler")
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner
            .triggered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

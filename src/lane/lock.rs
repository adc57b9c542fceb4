//! Advisory lock on a lane's working directory
//!
//! Uses `fs2` exclusive locks so two drivers never run stages in the same
//! working directory at once. Advisory locks are cooperative; the node
//! itself never touches the lock file.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::constants::LANE_LOCK_FILE_NAME;

/// Held for the whole lane run; released on drop.
#[derive(Debug)]
pub struct LaneLock {
    file: File,
    path: PathBuf,
}

impl LaneLock {
    /// Take the lock without blocking, failing if another driver holds it.
    ///
    /// The holder's PID is written into the lock file for diagnostics.
    pub fn acquire(working_directory: &Path) -> Result<Self> {
        let path = working_directory.join(LANE_LOCK_FILE_NAME);
        // Truncated only after the lock is held, so a waiting driver never
        // wipes the current holder's PID.
        #[allow(clippy::suspicious_open_options)]
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        file.try_lock_exclusive().with_context(|| {
            format!(
                "Working directory {} is in use by another multistage driver (lock: {})",
                working_directory.display(),
                path.display()
            )
        })?;

        file.set_len(0)
            .with_context(|| format!("Failed to truncate lock file: {}", path.display()))?;
        writeln!(file, "{}", std::process::id())
            .with_context(|| format!("Failed to write lock file: {}", path.display()))?;

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LaneLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

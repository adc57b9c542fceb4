//! Process utilities for the node supervisor.

use std::process::Command;

/// Check if a process with the given PID is alive
///
/// Uses `kill` with the null signal. `EPERM` means the process exists but we
/// may not signal it; `ESRCH` means it does not exist.
#[cfg(test)]
pub(crate) fn is_process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(pid_i32) = i32::try_from(pid) else {
        return false;
    };

    match kill(Pid::from_raw(pid_i32), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(Errno::ESRCH) => false,
        Err(_) => false,
    }
}

/// Raise the child's soft `RLIMIT_NOFILE` toward `limit` before it executes.
///
/// Best effort: the soft limit is clamped to the hard limit and failures are
/// ignored, so the node still starts on systems that refuse the change.
pub fn apply_open_files_limit(command: &mut Command, limit: u64) {
    use std::os::unix::process::CommandExt;

    // SAFETY: the hook only issues getrlimit/setrlimit syscalls, which are
    // async-signal-safe, and touches no memory shared with the parent.
    unsafe {
        command.pre_exec(move || {
            raise_open_files_limit(limit);
            Ok(())
        });
    }
}

fn raise_open_files_limit(limit: u64) {
    use nix::sys::resource::{getrlimit, setrlimit, Resource};

    if let Ok((soft, hard)) = getrlimit(Resource::RLIMIT_NOFILE) {
        let target = limit.min(hard);
        if target > soft {
            let _ = setrlimit(Resource::RLIMIT_NOFILE, target, hard);
        }
    }
}

//! Process-wait activity
//!
//! The thread running [`await_exit`] is the only owner of the node's
//! [`Child`]. Kill requests reach it over a channel, so the process is never
//! signalled after it has been reaped.

use std::convert::Infallible;
use std::io;
use std::process::{Child, ExitStatus};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use wait_timeout::ChildExt;

use crate::constants::KILL_CHECK_INTERVAL;

/// Wait for `child` to exit, killing it when asked to.
///
/// `exited` is dropped on return; the monitor observes the disconnect as
/// "process exited". A disconnected `kill_requests` channel means the monitor
/// is gone, and the child is killed rather than left running.
pub(crate) fn await_exit(
    mut child: Child,
    kill_requests: Receiver<()>,
    exited: Sender<Infallible>,
) -> io::Result<ExitStatus> {
    let _exited = exited;
    let pid = child.id();

    loop {
        match child.wait_timeout(KILL_CHECK_INTERVAL) {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        }

        match kill_requests.try_recv() {
            Ok(()) => {
                tracing::debug!(pid, "sending SIGKILL to node");
                return kill_and_reap(&mut child);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                tracing::warn!(pid, "node monitor went away, killing node");
                return kill_and_reap(&mut child);
            }
        }
    }
}

fn kill_and_reap(child: &mut Child) -> io::Result<ExitStatus> {
    child.kill()?;
    child.wait()
}

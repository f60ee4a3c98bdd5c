//! Async reaping (§4.7). SIGCHLD is coalesced across every child in the
//! process, so each waiter just reacts to "something exited" and retries
//! its own `waitpid(WNOHANG)` until it's the one that reaped.

use super::error::from_nix;
use crate::{error::Error, platform::Pid, status::TerminationStatus};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use tokio::signal::unix::{signal, SignalKind};

pub(crate) async fn wait_for_exit(pid: Pid) -> Result<TerminationStatus, Error> {
    let mut child_signals =
        signal(SignalKind::child()).map_err(|e| Error::io("signal(SIGCHLD)", e))?;

    loop {
        if let Some(status) = try_wait(pid)? {
            return Ok(status);
        }
        child_signals.recv().await;
    }
}

fn try_wait(pid: Pid) -> Result<Option<TerminationStatus>, Error> {
    match waitpid(nix::unistd::Pid::from_raw(pid), Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::StillAlive) => Ok(None),
        Ok(WaitStatus::Exited(_, code)) => Ok(Some(TerminationStatus::Exited(code))),
        Ok(WaitStatus::Signaled(_, sig, _)) => Ok(Some(TerminationStatus::Signaled(sig as i32))),
        Ok(_) => Ok(None),
        Err(nix::Error::Sys(nix::errno::Errno::ECHILD)) => {
            // Already reaped by a previous call racing us; nothing more to
            // report beyond "it's gone".
            Ok(Some(TerminationStatus::Exited(0)))
        }
        Err(e) => Err(Error::io("waitpid", from_nix(e))),
    }
}

//! Async reaping (§4.7). Windows has no waitable-child-exit signal the way
//! `SIGCHLD` is one: a dedicated OS thread blocks on `WaitForSingleObject`
//! for exactly this child's lifetime and reports the result back over a
//! oneshot channel. A raw `std::thread::spawn` rather than
//! `tokio::task::spawn_blocking` is deliberate: under heavy concurrent
//! spawning (§8's 2000-way scenario) `spawn_blocking`'s bounded pool would
//! fill with threads parked for a child's entire lifetime, starving
//! unrelated blocking work queued behind them.

use super::{
    error::{Cvt, Error},
    util::OwnedHandle,
};
use crate::{platform::RawDescriptor, status::TerminationStatus};
use tokio::sync::oneshot;
use winapi::um::{
    processthreadsapi::GetExitCodeProcess,
    synchapi::WaitForSingleObject,
    winbase::{INFINITE, WAIT_OBJECT_0},
};

/// Consumes (and, on completion, closes) the process handle produced by
/// `spawn::spawn`.
pub(crate) async fn wait_for_exit(
    process_handle: RawDescriptor,
) -> Result<TerminationStatus, crate::error::Error> {
    let handle = OwnedHandle::new(process_handle as winapi::um::winnt::HANDLE);
    let (tx, rx) = oneshot::channel::<Result<TerminationStatus, Error>>();

    std::thread::Builder::new()
        .name(format!("execkit-wait-{}", process_handle as usize))
        .spawn(move || {
            let _ = tx.send(block_until_exit(&handle));
        })
        .expect("failed to spawn wait thread");

    match rx.await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(Error::BackgroundThreadFailure.into()),
    }
}

fn block_until_exit(handle: &OwnedHandle) -> Result<TerminationStatus, Error> {
    let res = unsafe { WaitForSingleObject(handle.as_raw(), INFINITE) };
    if res != WAIT_OBJECT_0 {
        tracing::error!(return_value = res, "unexpected return from WaitForSingleObject");
        return Err(Error::BackgroundThreadFailure);
    }
    get_status(handle)
}

fn get_status(handle: &OwnedHandle) -> Result<TerminationStatus, Error> {
    let mut exit_code = 0;
    unsafe {
        Cvt::nonzero(GetExitCodeProcess(handle.as_raw(), &mut exit_code))?;
    }
    // A negative exit code (signed interpretation) is the conventional way
    // Windows processes communicate "killed by an uncaught
    // exception/terminated abnormally" — surfaced as `Signaled` to keep one
    // shape across platforms (§4.7).
    let signed = exit_code as i32;
    Ok(if signed < 0 {
        TerminationStatus::Signaled(signed)
    } else {
        TerminationStatus::Exited(signed)
    })
}

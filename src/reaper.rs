//! Cross-platform reaping entry point (§4.7 `Reaper`).
//!
//! Just a `#[cfg]` dispatch over the two backends' wait primitives — the
//! SIGCHLD loop on POSIX, the dedicated-thread `WaitForSingleObject` bridge
//! on Windows — so [`crate::execution::Execution`] never sees the difference.

use crate::{error::Error, platform::RawDescriptor, status::TerminationStatus};

#[cfg(unix)]
pub(crate) async fn wait_for_exit(pid: RawDescriptor) -> Result<TerminationStatus, Error> {
    crate::platform::sys::wait::wait_for_exit(pid).await
}

#[cfg(windows)]
pub(crate) async fn wait_for_exit(process_handle: RawDescriptor) -> Result<TerminationStatus, Error> {
    crate::platform::sys::wait::wait_for_exit(process_handle).await
}

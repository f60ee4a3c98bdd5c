//! Pipe creation and `/dev/null` handling (§4.1, §4.3 `None` variant).

use super::error::from_nix;
use std::{io, os::unix::io::RawFd};

/// Creates a `pipe2(O_CLOEXEC)` pair, matching §4.2: close-on-exec by
/// default, so a descriptor only survives into the child when the spawner
/// explicitly `dup2`s it onto 0/1/2.
pub(crate) fn create() -> io::Result<(RawFd, RawFd)> {
    let (read, write) = nix::unistd::pipe2(nix::fcntl::OFlag::O_CLOEXEC).map_err(from_nix)?;
    Ok((read, write))
}

pub(crate) fn close(fd: RawFd) {
    let _ = nix::unistd::close(fd);
}

/// Opens `/dev/null` for the requested direction, close-on-exec.
pub(crate) fn open_dev_null(writable: bool) -> io::Result<RawFd> {
    use nix::fcntl::{open, OFlag};
    use nix::sys::stat::Mode;

    let flags = if writable {
        OFlag::O_WRONLY | OFlag::O_CLOEXEC
    } else {
        OFlag::O_RDONLY | OFlag::O_CLOEXEC
    };
    open("/dev/null", flags, Mode::empty()).map_err(from_nix)
}

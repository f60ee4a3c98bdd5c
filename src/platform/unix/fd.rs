//! Free functions over raw fds. Ownership lives one level up, in
//! [`crate::pipe::Pipe`] and the spawner — this module only wraps the
//! syscalls, the way the reference backend's `Fd` type does internally.

use super::error::from_nix;
use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};
use std::{io, os::unix::io::RawFd};

pub(crate) fn read(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    nix::unistd::read(fd, buf).map_err(from_nix)
}

pub(crate) fn write(fd: RawFd, buf: &[u8]) -> io::Result<usize> {
    nix::unistd::write(fd, buf).map_err(from_nix)
}

pub(crate) fn close(fd: RawFd) {
    let _ = nix::unistd::close(fd);
}

pub(crate) fn dup(fd: RawFd) -> io::Result<RawFd> {
    nix::unistd::dup(fd).map_err(from_nix)
}

/// Clears `FD_CLOEXEC` so the descriptor survives into the child across
/// `execve`. Pipes are created `O_CLOEXEC` by default (§4.2); only the
/// three descriptors that land on the child's fds 0/1/2 need this cleared,
/// and `dup2` already does that implicitly for those — this is for the
/// rarer case of a caller-supplied `FromFileDescriptor` handle that isn't
/// going through a `dup2` slot (e.g. an extra inherited fd).
pub(crate) fn allow_inherit(fd: RawFd) -> io::Result<()> {
    fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty()))
        .map(drop)
        .map_err(from_nix)
}

pub(crate) fn set_nonblocking(fd: RawFd, nonblocking: bool) -> io::Result<()> {
    let raw = fcntl(fd, FcntlArg::F_GETFL).map_err(from_nix)?;
    let mut flags = OFlag::from_bits_truncate(raw);
    flags.set(OFlag::O_NONBLOCK, nonblocking);
    fcntl(fd, FcntlArg::F_SETFL(flags)).map(drop).map_err(from_nix)
}


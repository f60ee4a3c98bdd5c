//! Raw syscall result conversion, grounded in the `nix`/`libc` usage the
//! rest of this backend is built on.

use std::io;

/// Converts a `nix::Error` into a plain `io::Error` carrying the errno, the
/// way the reference backend's `cvt_error` helper does.
pub(crate) fn from_nix(err: nix::Error) -> io::Error {
    match err {
        nix::Error::Sys(errno) => io::Error::from_raw_os_error(errno as i32),
        other => io::Error::new(io::ErrorKind::Other, other),
    }
}

pub(crate) fn last() -> io::Error {
    io::Error::last_os_error()
}

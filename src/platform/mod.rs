//! Platform shim boundary (§4.1 `PlatformShim`).
//!
//! Nothing outside this module (and its two backends) touches a raw fd,
//! `HANDLE`, `libc`/`nix`/`winapi` call, or OS error code directly. Each
//! backend exposes the same small surface — `pipe`, `open_dev_null`,
//! `spawn`, `wait`, `send_signal`, `path_accessible`, `search_path` — under
//! the `sys` alias so the rest of the crate can stay `#[cfg]`-free.

#[cfg(unix)]
pub mod unix;
#[cfg(windows)]
pub mod windows;

#[cfg(unix)]
pub use unix as sys;
#[cfg(windows)]
pub use windows as sys;

/// An OS-owned descriptor: a file descriptor on POSIX, a `HANDLE` value on
/// Windows (stored as `isize` rather than the raw pointer type so it stays
/// `Send`/`Copy` the way a plain fd already is — kernel handles are safe to
/// use from any thread, only the `*mut c_void` representation isn't
/// auto-`Send`). Ownership is tracked by [`crate::pipe::Pipe`] and the
/// backend-specific owned wrappers, not by this type.
#[cfg(unix)]
pub type RawDescriptor = std::os::unix::io::RawFd;
#[cfg(windows)]
pub type RawDescriptor = isize;

/// Process identifier as returned by `spawn`.
#[cfg(unix)]
pub type Pid = libc::pid_t;
#[cfg(windows)]
pub type Pid = u32;

pub(crate) fn close_raw(fd: RawDescriptor) {
    sys::pipe::close(fd);
}

pub(crate) fn read_raw(fd: RawDescriptor, buf: &mut [u8]) -> std::io::Result<usize> {
    sys::fd::read(fd, buf)
}

pub(crate) fn write_raw(fd: RawDescriptor, buf: &[u8]) -> std::io::Result<usize> {
    sys::fd::write(fd, buf)
}

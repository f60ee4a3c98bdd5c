//! `PlatformShim` operations that don't fit `pipe`/`spawn`/`wait`:
//! executable resolution and signal delivery (§4.1, §6).

use super::error::from_nix;
use crate::platform::Pid;
use std::{
    convert::TryFrom,
    ffi::OsStr,
    io,
    os::unix::ffi::OsStrExt,
    path::{Path, PathBuf},
};

/// `access(path, X_OK)`.
pub(crate) fn is_executable(path: &Path) -> bool {
    nix::unistd::access(path, nix::unistd::AccessFlags::X_OK).is_ok()
}

/// Search order per §6: the caller-supplied PATH (or the parent's, when
/// inheriting), falling back to the fixed list the spec pins down so a
/// minimal/empty PATH still finds core utilities.
const FALLBACK_DIRS: &[&str] = &["/usr/bin", "/bin", "/usr/sbin", "/sbin", "/usr/local/bin"];

pub(crate) fn search_path(name: &OsStr, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let mut dirs: Vec<PathBuf> = path_var
        .map(|p| std::env::split_paths(p).collect())
        .unwrap_or_default();
    dirs.extend(FALLBACK_DIRS.iter().map(PathBuf::from));

    for dir in dirs {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

pub(crate) fn send_signal(pid: Pid, signal: libc::c_int, to_group: bool) -> io::Result<()> {
    let target = if to_group { -pid } else { pid };
    match nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(target),
        nix::sys::signal::Signal::try_from(signal).map_err(from_nix)?,
    ) {
        Ok(()) => Ok(()),
        Err(nix::Error::Sys(nix::errno::Errno::ESRCH)) => Ok(()),
        Err(e) => Err(from_nix(e)),
    }
}

pub(crate) fn cstring(bytes: &[u8]) -> io::Result<std::ffi::CString> {
    std::ffi::CString::new(bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

pub(crate) fn path_to_cstring(path: &Path) -> io::Result<std::ffi::CString> {
    cstring(path.as_os_str().as_bytes())
}

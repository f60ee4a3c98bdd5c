//! Crate-wide error taxonomy.
//!
//! Every fallible operation in this crate returns [`Error`]. Platform
//! backends (`unix`, `windows`) keep their own raw-errno/HRESULT wrapper
//! types internally and convert into this enum at the module boundary, the
//! way the platform-specific backends this crate is built on each keep a
//! local `Error` and funnel it upward.

use std::{ffi::OsString, path::PathBuf};

/// The single error type returned by every public operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("executable {name:?} could not be resolved against PATH")]
    ExecutableNotResolvable { name: OsString },

    #[error("working directory {path:?} is not accessible")]
    WorkingDirectoryInvalid { path: PathBuf },

    #[error("spawn failed: {os_error}")]
    SpawnFailed { os_error: std::io::Error },

    #[error("io error during {op}: {os_error}")]
    IoError {
        op: &'static str,
        os_error: std::io::Error,
    },

    #[error("teardown grace period expired")]
    Timeout,

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation not supported on this platform: {what}")]
    UnsupportedOperation { what: &'static str },
}

impl Error {
    pub(crate) fn io(op: &'static str, os_error: std::io::Error) -> Self {
        Error::IoError { op, os_error }
    }

    /// True for errors that represent a child that simply is not there any
    /// more (e.g. a post-exit `send_signal`). Callers that want the benign
    /// `ESRCH`/`EPIPE` semantics described by the spec can use this to avoid
    /// failing a `RunDriver` on races they don't care about.
    pub fn is_benign_after_exit(&self) -> bool {
        match self {
            Error::IoError { os_error, .. } => matches!(
                os_error.raw_os_error(),
                Some(code) if code == libc_esrch() || os_error.kind() == std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

#[cfg(unix)]
fn libc_esrch() -> i32 {
    libc::ESRCH
}

#[cfg(not(unix))]
fn libc_esrch() -> i32 {
    -1
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

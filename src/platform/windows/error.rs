//! Win32/HRESULT result conversion, grounded in the reference backend's
//! `Cvt` helper pattern.

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("winapi call failed: {errno}")]
    Syscall { errno: u32 },
    #[error("hresult call failed: {hresult}")]
    Hresult { hresult: i32 },
    #[error("background wait thread failed")]
    BackgroundThreadFailure,
}

impl From<u32> for Error {
    fn from(errno: u32) -> Self {
        Error::Syscall { errno }
    }
}

impl Error {
    pub(crate) fn last() -> Self {
        let errno = unsafe { winapi::um::errhandlingapi::GetLastError() };
        if cfg!(debug_assertions) {
            tracing::error!(errno = errno, backtrace = ?backtrace::Backtrace::new(), "win32 error");
        } else {
            tracing::error!(errno = errno, "win32 error");
        }
        Error::Syscall { errno }
    }
}

impl From<Error> for crate::error::Error {
    fn from(err: Error) -> Self {
        let io_err = match err {
            Error::Syscall { errno } => std::io::Error::from_raw_os_error(errno as i32),
            Error::Hresult { hresult } => {
                std::io::Error::from_raw_os_error(hresult)
            }
            Error::BackgroundThreadFailure => {
                std::io::Error::new(std::io::ErrorKind::Other, "background wait thread failed")
            }
        };
        crate::error::Error::io("win32", io_err)
    }
}

/// Helper for checking raw winapi return values.
pub(crate) struct Cvt {
    _priv: (),
}

impl Cvt {
    /// Checks that the call returned a non-zero (success) result.
    pub(crate) fn nonzero(ret: i32) -> Result<i32, Error> {
        if ret != 0 {
            Ok(ret)
        } else {
            Err(Error::last())
        }
    }

    /// Checks that an `HRESULT` indicates success.
    pub(crate) fn hresult(hr: winapi::shared::winerror::HRESULT) -> Result<(), Error> {
        if winapi::shared::winerror::SUCCEEDED(hr) {
            Ok(())
        } else {
            tracing::error!(result = hr, "unsuccessful HRESULT");
            Err(Error::Hresult { hresult: hr })
        }
    }
}

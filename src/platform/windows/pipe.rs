//! Pipe and `NUL` handling (§4.1, §4.3 `None` variant), mirroring the POSIX
//! backend's free-function shape so [`crate::pipe::Pipe`] stays `#[cfg]`-free.

use super::error::Cvt;
use crate::platform::RawDescriptor;
use std::{io, ptr};
use winapi::{
    shared::minwindef::TRUE,
    um::{
        fileapi::{CreateFileW, OPEN_EXISTING},
        handleapi::CloseHandle,
        minwinbase::SECURITY_ATTRIBUTES,
        namedpipeapi::CreatePipe,
        winnt::{FILE_SHARE_READ, FILE_SHARE_WRITE, GENERIC_READ, GENERIC_WRITE, HANDLE},
    },
};

fn inheritable_security_attributes() -> SECURITY_ATTRIBUTES {
    let mut attrs: SECURITY_ATTRIBUTES = unsafe { std::mem::zeroed() };
    attrs.nLength = std::mem::size_of::<SECURITY_ATTRIBUTES>() as u32;
    attrs.bInheritHandle = TRUE;
    attrs
}

/// Creates an anonymous pipe whose handles are inheritable; the spawner
/// decides per-end whether to pass it into `STARTUPINFOW` (mirroring the
/// POSIX backend's `dup2`-driven inheritance instead of CLOEXEC).
pub(crate) fn create() -> io::Result<(RawDescriptor, RawDescriptor)> {
    let mut read: HANDLE = ptr::null_mut();
    let mut write: HANDLE = ptr::null_mut();
    let mut attrs = inheritable_security_attributes();
    unsafe {
        Cvt::nonzero(CreatePipe(&mut read, &mut write, &mut attrs, 0))
            .map_err(|_| io::Error::last_os_error())?;
    }
    Ok((read as RawDescriptor, write as RawDescriptor))
}

pub(crate) fn close(handle: RawDescriptor) {
    unsafe {
        CloseHandle(handle as HANDLE);
    }
}

pub(crate) fn open_dev_null(writable: bool) -> io::Result<RawDescriptor> {
    let mut name: Vec<u16> = "NUL".encode_utf16().collect();
    name.push(0);
    let mut attrs = inheritable_security_attributes();
    let access = if writable { GENERIC_WRITE } else { GENERIC_READ };
    let handle = unsafe {
        CreateFileW(
            name.as_ptr(),
            access,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            &mut attrs,
            OPEN_EXISTING,
            0,
            ptr::null_mut(),
        )
    };
    if handle == winapi::um::handleapi::INVALID_HANDLE_VALUE {
        return Err(io::Error::last_os_error());
    }
    Ok(handle as RawDescriptor)
}

//! Free functions over raw `HANDLE`s, mirroring the POSIX backend's `fd`
//! module so pumps can stay platform-agnostic.

use crate::platform::RawDescriptor;
use std::io;
use winapi::um::{
    fileapi::{ReadFile, WriteFile},
    winnt::HANDLE,
};

pub(crate) fn read(handle: RawDescriptor, buf: &mut [u8]) -> io::Result<usize> {
    let len = buf.len().min(u32::MAX as usize) as u32;
    let mut read_cnt = 0u32;
    let ok = unsafe {
        ReadFile(handle as HANDLE, buf.as_mut_ptr().cast(), len, &mut read_cnt, std::ptr::null_mut())
    };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(read_cnt as usize)
}

pub(crate) fn write(handle: RawDescriptor, buf: &[u8]) -> io::Result<usize> {
    let len = buf.len().min(u32::MAX as usize) as u32;
    let mut written = 0u32;
    let ok = unsafe {
        WriteFile(handle as HANDLE, buf.as_ptr().cast(), len, &mut written, std::ptr::null_mut())
    };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(written as usize)
}

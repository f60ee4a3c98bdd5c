//! Owned `HANDLE` wrapper shared by pipes and child-process handles.

use super::error::{Cvt, Error};
use std::mem::ManuallyDrop;
use winapi::{
    shared::minwindef::{FALSE, TRUE},
    um::{
        handleapi::{CloseHandle, DuplicateHandle, INVALID_HANDLE_VALUE},
        processthreadsapi::GetCurrentProcess,
        winnt::{DUPLICATE_SAME_ACCESS, HANDLE},
    },
};

#[derive(Debug)]
pub(crate) struct OwnedHandle(HANDLE);

unsafe impl Send for OwnedHandle {}
unsafe impl Sync for OwnedHandle {}

impl OwnedHandle {
    pub(crate) fn new(h: HANDLE) -> Self {
        assert_ne!(h, INVALID_HANDLE_VALUE);
        OwnedHandle(h)
    }

    pub(crate) fn as_raw(&self) -> HANDLE {
        self.0
    }

    pub(crate) fn into_inner(self) -> HANDLE {
        let this = ManuallyDrop::new(self);
        this.0
    }

    pub(crate) fn read(&self, mut buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.len() > i32::max_value() as usize {
            buf = &mut buf[..(i32::max_value() as usize)]
        }
        let mut read_cnt = 0;
        let res = unsafe {
            winapi::um::fileapi::ReadFile(
                self.0,
                buf.as_mut_ptr().cast(),
                buf.len() as u32,
                &mut read_cnt,
                std::ptr::null_mut(),
            )
        };

        if res == 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(read_cnt as usize)
    }

    pub(crate) fn write(&self, mut buf: &[u8]) -> std::io::Result<usize> {
        if buf.len() > (i32::max_value() as usize) {
            buf = &buf[..(i32::max_value() as usize)];
        }
        let mut written_cnt = 0;
        let res = unsafe {
            winapi::um::fileapi::WriteFile(
                self.0,
                buf.as_ptr().cast(),
                buf.len() as u32,
                &mut written_cnt,
                std::ptr::null_mut(),
            )
        };
        if res != 0 {
            Ok(written_cnt as usize)
        } else {
            Err(std::io::Error::last_os_error())
        }
    }

    fn duplicate(&self, inherit: bool) -> Result<Self, Error> {
        let mut cloned_handle = std::ptr::null_mut();
        unsafe {
            Cvt::nonzero(DuplicateHandle(
                GetCurrentProcess(),
                self.as_raw(),
                GetCurrentProcess(),
                &mut cloned_handle,
                0,
                if inherit { TRUE } else { FALSE },
                DUPLICATE_SAME_ACCESS,
            ))?;
        }
        Ok(Self::new(cloned_handle))
    }

    pub(crate) fn try_clone(&self) -> Result<Self, Error> {
        self.duplicate(false)
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        let ret = unsafe { CloseHandle(self.0) };
        if ret == 0 {
            panic!("failed to close handle {}", self.0 as usize);
        }
    }
}

/// `GenerateConsoleCtrlEvent` targets a process *group*, not a handle — it
/// only reaches children spawned with `CREATE_NEW_PROCESS_GROUP`, using
/// their own process id as the group id.
pub(crate) fn send_ctrl_event(process_group_id: u32, event: u32) -> std::io::Result<()> {
    let ok = unsafe { winapi::um::wincon::GenerateConsoleCtrlEvent(event, process_group_id) };
    if ok == 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

pub(crate) fn terminate(process_handle: crate::platform::RawDescriptor) -> std::io::Result<()> {
    let ok = unsafe {
        winapi::um::processthreadsapi::TerminateProcess(process_handle as HANDLE, 1)
    };
    if ok == 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

const FALLBACK_DIRS: &[&str] = &["C:\\Windows\\System32", "C:\\Windows"];

/// PATH/PATHEXT search mirroring the POSIX backend's `search_path`, since
/// `CreateProcessW` only does this resolution itself when given a bare
/// command line with a null `lpApplicationName` — this crate always
/// resolves explicitly so both backends apply the same order (§6).
pub(crate) fn search_path(
    name: &std::ffi::OsStr,
    path_var: Option<&std::ffi::OsStr>,
) -> Option<std::path::PathBuf> {
    let mut dirs: Vec<std::path::PathBuf> = path_var
        .map(|p| std::env::split_paths(p).collect())
        .unwrap_or_default();
    dirs.extend(FALLBACK_DIRS.iter().map(std::path::PathBuf::from));

    let extensions: Vec<String> = std::env::var("PATHEXT")
        .unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string())
        .split(';')
        .map(|s| s.to_string())
        .collect();

    let name_has_extension = std::path::Path::new(name).extension().is_some();

    for dir in dirs {
        let base = dir.join(name);
        if name_has_extension && base.is_file() {
            return Some(base);
        }
        for ext in &extensions {
            let candidate = dir.join(format!("{}{}", name.to_string_lossy(), ext));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

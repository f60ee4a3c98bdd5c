//! `CreateProcessW` spawning (§4.5, §4.8 Windows path).

use super::error::{Cvt, Error};
use crate::{
    config::{Configuration, ConsoleBehavior, WindowStyle},
    platform::RawDescriptor,
};
use std::{
    ffi::{OsStr, OsString},
    mem::size_of,
    os::windows::ffi::OsStrExt,
};
use winapi::{
    shared::{minwindef::TRUE, winerror::ERROR_INSUFFICIENT_BUFFER},
    um::{
        errhandlingapi::GetLastError,
        processthreadsapi::{
            CreateProcessW, DeleteProcThreadAttributeList, InitializeProcThreadAttributeList,
            UpdateProcThreadAttribute, PROCESS_INFORMATION, PROC_THREAD_ATTRIBUTE_LIST,
        },
        winbase::{
            CreateProcessWithLogonW, CREATE_NEW_CONSOLE, CREATE_NEW_PROCESS_GROUP,
            CREATE_NO_WINDOW, CREATE_UNICODE_ENVIRONMENT, DETACHED_PROCESS,
            EXTENDED_STARTUPINFO_PRESENT, LOGON_WITH_PROFILE, STARTF_USESHOWWINDOW,
            STARTF_USESTDHANDLES, STARTUPINFOEXW,
        },
        winnt::HANDLE,
        winuser::{SW_HIDE, SW_MAXIMIZE, SW_MINIMIZE, SW_SHOWNORMAL},
    },
};

/// `PROC_THREAD_ATTRIBUTE_HANDLE_LIST`. Not exported by the `winapi` crate;
/// derived the way the reference backend derives its own
/// security-capabilities attribute id: `PROC_THREAD_ATTRIBUTE_INPUT (0x20000)
/// | ProcThreadAttributeHandleList (2)`.
const PROC_THREAD_ATTRIBUTE_HANDLE_LIST: usize = 0x20002;

pub(crate) struct ChildHandles {
    pub stdin: RawDescriptor,
    pub stdout: RawDescriptor,
    pub stderr: RawDescriptor,
}

pub(crate) struct SpawnResult {
    pub pid: u32,
    pub process_handle: RawDescriptor,
    pub thread_handle: RawDescriptor,
}

pub(crate) fn spawn(
    exe: &OsStr,
    argv0: &OsStr,
    argv: &[OsString],
    env_block: &[u16],
    cwd: Option<&OsStr>,
    handles: &ChildHandles,
    config: &Configuration,
) -> Result<SpawnResult, Error> {
    let application_name: Vec<u16> = exe.encode_wide().chain(Some(0)).collect();
    let mut cmd_line = build_command_line(argv0, argv);
    let cwd_w: Option<Vec<u16>> = cwd.map(|c| c.encode_wide().chain(Some(0)).collect());

    let mut startup_info: STARTUPINFOEXW = unsafe { std::mem::zeroed() };
    startup_info.StartupInfo.cb = size_of::<STARTUPINFOEXW>() as u32;
    startup_info.StartupInfo.dwFlags = STARTF_USESTDHANDLES;
    startup_info.StartupInfo.hStdInput = handles.stdin as _;
    startup_info.StartupInfo.hStdOutput = handles.stdout as _;
    startup_info.StartupInfo.hStdError = handles.stderr as _;

    let win_opts = &config.windows_options;
    if win_opts.window_style != WindowStyle::Normal {
        startup_info.StartupInfo.dwFlags |= STARTF_USESHOWWINDOW;
        startup_info.StartupInfo.wShowWindow = match win_opts.window_style {
            WindowStyle::Normal => SW_SHOWNORMAL as u16,
            WindowStyle::Hidden => SW_HIDE as u16,
            WindowStyle::Minimized => SW_MINIMIZE as u16,
            WindowStyle::Maximized => SW_MAXIMIZE as u16,
        };
    }

    let mut creation_flags = CREATE_UNICODE_ENVIRONMENT | EXTENDED_STARTUPINFO_PRESENT;
    creation_flags |= match win_opts.console_behavior {
        ConsoleBehavior::Inherit => 0,
        ConsoleBehavior::NewConsole => CREATE_NEW_CONSOLE,
        ConsoleBehavior::NoWindow => CREATE_NO_WINDOW,
        ConsoleBehavior::Detached => DETACHED_PROCESS,
    };
    if win_opts.create_process_group {
        creation_flags |= CREATE_NEW_PROCESS_GROUP;
    }

    let mut info: PROCESS_INFORMATION = unsafe { std::mem::zeroed() };
    let env_ptr = env_block.as_ptr() as *mut _;
    let cwd_ptr = cwd_w.as_ref().map(|c| c.as_ptr()).unwrap_or(std::ptr::null());

    // Only stdin/stdout/stderr should cross into the child. Without this the
    // child inherits every other handle this process has open — including
    // the pipe ends of unrelated in-flight spawns — and a sibling pipe's
    // true owner closing its write end won't produce EOF until this child
    // also exits (§4.1, §4.5 step 6).
    let mut inheritable_handles: [HANDLE; 3] =
        [handles.stdin as HANDLE, handles.stdout as HANDLE, handles.stderr as HANDLE];
    let mut attribute_list_buffer = allocate_attribute_list(1)?;
    let attribute_list = attribute_list_buffer.as_mut_ptr() as *mut PROC_THREAD_ATTRIBUTE_LIST;

    unsafe {
        let mut list_size = attribute_list_buffer.len() * size_of::<u64>();
        Cvt::nonzero(InitializeProcThreadAttributeList(
            attribute_list,
            1,
            0,
            &mut list_size,
        ))?;
        let init_result = Cvt::nonzero(UpdateProcThreadAttribute(
            attribute_list,
            0,
            PROC_THREAD_ATTRIBUTE_HANDLE_LIST,
            inheritable_handles.as_mut_ptr().cast(),
            inheritable_handles.len() * size_of::<HANDLE>(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        ));
        if let Err(e) = init_result {
            DeleteProcThreadAttributeList(attribute_list);
            return Err(e);
        }
        startup_info.lpAttributeList = attribute_list;

        let ok = if let Some(logon) = &win_opts.logon {
            let username: Vec<u16> = logon.username.encode_wide().chain(Some(0)).collect();
            let domain: Vec<u16> = logon
                .domain
                .as_deref()
                .unwrap_or_default()
                .encode_wide()
                .chain(Some(0))
                .collect();
            let password: Vec<u16> = logon.password.encode_wide().chain(Some(0)).collect();
            CreateProcessWithLogonW(
                username.as_ptr(),
                if logon.domain.is_some() { domain.as_ptr() } else { std::ptr::null() },
                password.as_ptr(),
                LOGON_WITH_PROFILE,
                application_name.as_ptr(),
                cmd_line.as_mut_ptr(),
                creation_flags,
                env_ptr.cast(),
                cwd_ptr,
                &mut startup_info.StartupInfo,
                &mut info,
            )
        } else {
            CreateProcessW(
                application_name.as_ptr(),
                cmd_line.as_mut_ptr(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                TRUE,
                creation_flags,
                env_ptr.cast(),
                cwd_ptr,
                &mut startup_info.StartupInfo,
                &mut info,
            )
        };
        let spawn_result = Cvt::nonzero(ok);
        DeleteProcThreadAttributeList(attribute_list);
        spawn_result?;
    }

    Ok(SpawnResult {
        pid: info.dwProcessId,
        process_handle: info.hProcess as RawDescriptor,
        thread_handle: info.hThread as RawDescriptor,
    })
}

/// `InitializeProcThreadAttributeList`'s buffer size isn't known until a
/// first call with a null list reports how many bytes it needs; `u64`-backed
/// storage keeps the buffer 8-byte aligned the way the attribute list
/// structure requires.
fn allocate_attribute_list(attribute_count: u32) -> Result<Vec<u64>, Error> {
    let mut size: usize = 0;
    unsafe {
        InitializeProcThreadAttributeList(std::ptr::null_mut(), attribute_count, 0, &mut size);
        if GetLastError() != ERROR_INSUFFICIENT_BUFFER {
            return Err(Error::last());
        }
    }
    Ok(vec![0u64; (size + 7) / 8])
}

fn build_command_line(exe: &OsStr, argv: &[OsString]) -> Vec<u16> {
    let mut out = Vec::new();
    quote_arg(&mut out, exe);
    for arg in argv {
        out.push(b' ' as u16);
        quote_arg(&mut out, arg);
    }
    out.push(0);
    out
}

/// MSDN's "2n+1 backslash" rule: a literal quote in an argument needs to
/// survive both the C runtime's argv parser and this process's own quoting,
/// so a run of `n` backslashes directly preceding a `"` is doubled to `2n`
/// before the escaped quote, and a run preceding the argument's closing
/// quote is doubled to `2n` with no trailing quote to escape.
fn quote_arg(out: &mut Vec<u16>, arg: &OsStr) {
    let chars: Vec<u16> = arg.encode_wide().collect();
    let needs_quotes = chars.is_empty()
        || chars
            .iter()
            .any(|&c| c == b' ' as u16 || c == b'\t' as u16 || c == b'"' as u16);

    if !needs_quotes {
        out.extend_from_slice(&chars);
        return;
    }

    out.push(b'"' as u16);
    let mut backslashes = 0usize;
    for &c in &chars {
        if c == b'\\' as u16 {
            backslashes += 1;
        } else if c == b'"' as u16 {
            out.extend(std::iter::repeat(b'\\' as u16).take(backslashes * 2 + 1));
            out.push(b'"' as u16);
            backslashes = 0;
        } else {
            out.extend(std::iter::repeat(b'\\' as u16).take(backslashes));
            out.push(c);
            backslashes = 0;
        }
    }
    out.extend(std::iter::repeat(b'\\' as u16).take(backslashes * 2));
    out.push(b'"' as u16);
}

/// Builds a double-null-terminated `CREATE_UNICODE_ENVIRONMENT` block from
/// `KEY=VALUE` pairs, sorted the way `CreateProcessW` expects (the docs ask
/// for it; in practice Windows tolerates unsorted blocks, but sorting keeps
/// parity with what `cmd.exe`-spawned children see).
pub(crate) fn encode_env_block(pairs: &[OsString]) -> Vec<u16> {
    let mut sorted = pairs.to_vec();
    sorted.sort();
    let mut out = Vec::new();
    for pair in sorted {
        out.extend(pair.encode_wide());
        out.push(0);
    }
    out.push(0);
    out
}

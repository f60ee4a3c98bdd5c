//! `fork`+`exec` with the self-pipe trick (§4.5, §7 "on failure no child
//! exists"): the write end of a `CLOEXEC` pipe is only ever closed by a
//! successful `execve`, so the parent can tell "child is running" from
//! "child died before exec" by whether it reads 0 bytes or 4.

use super::{error::from_nix, fd, util};
use crate::{config::Configuration, error::Error, platform::Pid};
use nix::{
    fcntl::OFlag,
    sys::wait::waitpid,
    unistd::{fork, ForkResult},
};
use std::{
    collections::HashMap,
    ffi::{CString, OsString},
    os::unix::io::RawFd,
    path::Path,
};

/// The three standard descriptors the child should end up with, plus any
/// additional descriptors the caller wants inherited verbatim.
pub(crate) struct ChildFds {
    pub stdin: RawFd,
    pub stdout: RawFd,
    pub stderr: RawFd,
    pub extra: Vec<RawFd>,
}

pub(crate) fn spawn(
    resolved_path: &Path,
    argv0: &OsString,
    args: &[OsString],
    env: &HashMap<OsString, OsString>,
    cwd: Option<&Path>,
    fds: &ChildFds,
    config: &Configuration,
) -> Result<Pid, Error> {
    let path_c = util::path_to_cstring(resolved_path).map_err(|e| Error::io("path encoding", e))?;
    let argv_c = build_argv(argv0, args)?;
    let envp_c = build_envp(env)?;
    let cwd_c = cwd.map(util::path_to_cstring).transpose().map_err(|e| Error::io("cwd encoding", e))?;

    let (err_read, err_write) =
        nix::unistd::pipe2(OFlag::O_CLOEXEC).map_err(|e| Error::io("pipe2", from_nix(e)))?;

    // SAFETY: between fork() and execve()/_exit() the child only calls
    // async-signal-safe functions (raw syscalls via libc/nix primitives
    // that don't allocate or take locks held across the fork).
    match unsafe { fork() }.map_err(|e| Error::io("fork", from_nix(e)))? {
        ForkResult::Child => {
            fd::close(err_read);
            child_exec(
                &path_c, &argv_c, &envp_c, cwd_c.as_ref(), fds, config, err_write,
            );
            unreachable!("child_exec never returns");
        }
        ForkResult::Parent { child } => {
            fd::close(err_write);
            let pid = child.as_raw();
            match read_spawn_error(err_read) {
                None => Ok(pid),
                Some(errno) => {
                    // The child is dead or dying; reap it so no zombie (and
                    // no live child) survives a failed spawn.
                    let _ = waitpid(child, None);
                    Err(Error::SpawnFailed {
                        os_error: std::io::Error::from_raw_os_error(errno),
                    })
                }
            }
        }
    }
}

fn read_spawn_error(err_read: RawFd) -> Option<i32> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    loop {
        match fd::read(err_read, &mut buf[filled..]) {
            Ok(0) => {
                fd::close(err_read);
                return if filled == 0 { None } else { Some(i32::from_ne_bytes(buf)) };
            }
            Ok(n) => {
                filled += n;
                if filled == buf.len() {
                    fd::close(err_read);
                    return Some(i32::from_ne_bytes(buf));
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => {
                fd::close(err_read);
                return None;
            }
        }
    }
}

/// Runs entirely in the forked child. Never returns: either `execve`
/// succeeds (and this process image is gone) or it reports the errno on
/// `err_write` and calls `_exit(127)`.
fn child_exec(
    path: &CString,
    argv: &[CString],
    envp: &[CString],
    cwd: Option<&CString>,
    fds: &ChildFds,
    config: &Configuration,
    err_write: RawFd,
) -> ! {
    let fail = |errno: i32| -> ! {
        let bytes = errno.to_ne_bytes();
        let _ = fd::write(err_write, &bytes);
        unsafe { libc::_exit(127) };
    };

    if let Some(cwd) = cwd {
        if unsafe { libc::chdir(cwd.as_ptr()) } != 0 {
            fail(errno::errno().0);
        }
    }

    let opts = &config.unix_options;
    if let Some(gid) = opts.gid {
        if unsafe { libc::setgid(gid) } != 0 {
            fail(errno::errno().0);
        }
    }
    if let Some(groups) = &opts.supplementary_groups {
        if unsafe { libc::setgroups(groups.len(), groups.as_ptr()) } != 0 {
            fail(errno::errno().0);
        }
    }
    if let Some(uid) = opts.uid {
        if unsafe { libc::setuid(uid) } != 0 {
            fail(errno::errno().0);
        }
    }
    if opts.create_new_session {
        if unsafe { libc::setsid() } == -1 {
            fail(errno::errno().0);
        }
    } else if let Some(pgid) = opts.process_group {
        if unsafe { libc::setpgid(0, pgid as i32) } != 0 {
            fail(errno::errno().0);
        }
    }

    if dup2_checked(fds.stdin, 0).is_err() {
        fail(errno::errno().0);
    }
    if dup2_checked(fds.stdout, 1).is_err() {
        fail(errno::errno().0);
    }
    if dup2_checked(fds.stderr, 2).is_err() {
        fail(errno::errno().0);
    }
    for &extra in &fds.extra {
        if fd::allow_inherit(extra).is_err() {
            fail(errno::errno().0);
        }
    }

    if let Some(hook) = opts.pre_spawn_hook {
        // SAFETY: caller guarantees this function pointer is async-signal-safe.
        let rc = unsafe { hook() };
        if rc != 0 {
            fail(rc);
        }
    }

    let mut argv_ptrs: Vec<*const libc::c_char> = argv.iter().map(|a| a.as_ptr()).collect();
    argv_ptrs.push(std::ptr::null());
    let mut envp_ptrs: Vec<*const libc::c_char> = envp.iter().map(|e| e.as_ptr()).collect();
    envp_ptrs.push(std::ptr::null());

    unsafe {
        libc::execve(path.as_ptr(), argv_ptrs.as_ptr(), envp_ptrs.as_ptr());
    }
    fail(errno::errno().0);
}

fn dup2_checked(from: RawFd, to: RawFd) -> Result<(), ()> {
    if from == to {
        // Already in place (e.g. inheriting the parent's own stdio); clear
        // CLOEXEC in case this came from a pipe end.
        return fd::allow_inherit(to).map_err(|_| ());
    }
    if unsafe { libc::dup2(from, to) } < 0 {
        return Err(());
    }
    Ok(())
}

fn build_argv(argv0: &OsString, args: &[OsString]) -> Result<Vec<CString>, Error> {
    use std::os::unix::ffi::OsStrExt;
    let mut out = Vec::with_capacity(args.len() + 1);
    out.push(util::cstring(argv0.as_bytes()).map_err(|e| Error::io("argv0 encoding", e))?);
    for arg in args {
        out.push(util::cstring(arg.as_bytes()).map_err(|e| Error::io("argv encoding", e))?);
    }
    Ok(out)
}

fn build_envp(env: &HashMap<OsString, OsString>) -> Result<Vec<CString>, Error> {
    use std::os::unix::ffi::OsStrExt;
    let mut out = Vec::with_capacity(env.len());
    for (k, v) in env {
        let mut pair = k.as_bytes().to_vec();
        pair.push(b'=');
        pair.extend_from_slice(v.as_bytes());
        out.push(util::cstring(&pair).map_err(|e| Error::io("environment encoding", e))?);
    }
    Ok(out)
}

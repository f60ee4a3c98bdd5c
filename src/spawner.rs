//! Resolves a [`Configuration`] plus I/O specs into a running child (§4.5
//! `Spawner`).

use crate::{
    config::{Configuration, Executable},
    error::Error,
    io::{InputSource, OutputSink},
    pipe::Pipe,
    platform::{self, RawDescriptor},
};
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

/// A spawned child plus whichever pipe ends the parent side keeps.
pub(crate) struct Spawned {
    pub pid: RawDescriptor,
    pub stdin_pipe: Option<Pipe>,
    pub stdout_pipe: Option<Pipe>,
    pub stderr_pipe: Option<Pipe>,
}

pub(crate) fn spawn(
    config: &Configuration,
    stdin: &InputSource,
    stdout: &OutputSink,
    stderr: &OutputSink,
) -> Result<Spawned, Error> {
    let env = config.environment.materialize();
    let path_hint = config.environment.path_hint();

    let resolved = resolve_executable(&config.executable, path_hint.as_deref())?;
    if let Some(cwd) = &config.working_directory {
        validate_cwd(cwd)?;
    }

    let argv0 = config
        .argv0_override
        .clone()
        .unwrap_or_else(|| match &config.executable {
            Executable::Name(name) => name.clone(),
            Executable::Path(path) => path.as_os_str().to_owned(),
        });

    let stdin_pipe = stdin.requires_pump().then(Pipe::new);
    let stdout_pipe = stdout.requires_pump().then(Pipe::new);
    let stderr_pipe = stderr.requires_pump().then(Pipe::new);

    let result = spawn_platform(
        config,
        &resolved,
        &argv0,
        &env,
        stdin,
        stdout,
        stderr,
        stdin_pipe.as_ref(),
        stdout_pipe.as_ref(),
        stderr_pipe.as_ref(),
    );

    // On failure, any pipe ends already created must still be closed; the
    // `Pipe`s' `Drop` impls handle that as soon as this function returns.
    let (pid, _thread_handle) = result?;

    // The parent only ever talks to the opposite end from the child's —
    // close the child-side end now that the child (or the attempt) is done
    // with it.
    if stdin.requires_pump() {
        if let Some(p) = &stdin_pipe {
            p.close_read();
        }
    }
    if stdout.requires_pump() {
        if let Some(p) = &stdout_pipe {
            p.close_write();
        }
    }
    if stderr.requires_pump() {
        if let Some(p) = &stderr_pipe {
            p.close_write();
        }
    }

    Ok(Spawned {
        pid,
        stdin_pipe,
        stdout_pipe,
        stderr_pipe,
    })
}

#[cfg(unix)]
#[allow(clippy::too_many_arguments)]
fn spawn_platform(
    config: &Configuration,
    resolved: &Path,
    argv0: &OsString,
    env: &std::collections::HashMap<OsString, OsString>,
    stdin: &InputSource,
    stdout: &OutputSink,
    stderr: &OutputSink,
    stdin_pipe: Option<&Pipe>,
    stdout_pipe: Option<&Pipe>,
    stderr_pipe: Option<&Pipe>,
) -> Result<(RawDescriptor, ()), Error> {
    use platform::sys::spawn::ChildFds;

    let stdin_fd = child_side_input_fd(stdin, stdin_pipe)?;
    let stdout_fd = child_side_output_fd(stdout, stdout_pipe)?;
    let stderr_fd = child_side_output_fd(stderr, stderr_pipe)?;

    let fds = ChildFds {
        stdin: stdin_fd,
        stdout: stdout_fd,
        stderr: stderr_fd,
        extra: extra_inherited_fds(stdin, stdout, stderr),
    };

    let pid = platform::sys::spawn::spawn(
        resolved,
        argv0,
        &config.arguments,
        env,
        config.working_directory.as_deref(),
        &fds,
        config,
    )?;
    Ok((pid, ()))
}

#[cfg(unix)]
fn child_side_input_fd(source: &InputSource, pipe: Option<&Pipe>) -> Result<RawDescriptor, Error> {
    match source {
        InputSource::None => platform::sys::pipe::open_dev_null(false).map_err(|e| Error::io("open /dev/null", e)),
        InputSource::FromFileDescriptor { fd, .. } => Ok(*fd),
        _ => pipe.unwrap().read_end()?.ok_or_else(|| {
            Error::io("stdin pipe", std::io::Error::new(std::io::ErrorKind::Other, "pipe read end closed"))
        }),
    }
}

#[cfg(unix)]
fn child_side_output_fd(sink: &OutputSink, pipe: Option<&Pipe>) -> Result<RawDescriptor, Error> {
    match sink {
        OutputSink::Discard => platform::sys::pipe::open_dev_null(true).map_err(|e| Error::io("open /dev/null", e)),
        OutputSink::ToFileDescriptor { fd, .. } => Ok(*fd),
        _ => pipe.unwrap().write_end()?.ok_or_else(|| {
            Error::io("output pipe", std::io::Error::new(std::io::ErrorKind::Other, "pipe write end closed"))
        }),
    }
}

#[cfg(unix)]
fn extra_inherited_fds(stdin: &InputSource, stdout: &OutputSink, stderr: &OutputSink) -> Vec<RawDescriptor> {
    let mut extra = Vec::new();
    if let InputSource::FromFileDescriptor { fd, close_after_spawn: false } = stdin {
        extra.push(*fd);
    }
    for sink in [stdout, stderr] {
        if let OutputSink::ToFileDescriptor { fd, close_after_spawn: false } = sink {
            extra.push(*fd);
        }
    }
    extra
}

#[cfg(windows)]
#[allow(clippy::too_many_arguments)]
fn spawn_platform(
    config: &Configuration,
    resolved: &Path,
    argv0: &OsString,
    env: &std::collections::HashMap<OsString, OsString>,
    stdin: &InputSource,
    stdout: &OutputSink,
    stderr: &OutputSink,
    stdin_pipe: Option<&Pipe>,
    stdout_pipe: Option<&Pipe>,
    stderr_pipe: Option<&Pipe>,
) -> Result<(RawDescriptor, RawDescriptor), Error> {
    use platform::sys::spawn::{self, ChildHandles};

    let stdin_h = child_side_input_handle(stdin, stdin_pipe)?;
    let stdout_h = child_side_output_handle(stdout, stdout_pipe)?;
    let stderr_h = child_side_output_handle(stderr, stderr_pipe)?;

    let handles = ChildHandles { stdin: stdin_h, stdout: stdout_h, stderr: stderr_h };

    let env_pairs: Vec<OsString> = env.iter().map(|(k, v)| {
        let mut s = k.clone();
        s.push("=");
        s.push(v);
        s
    }).collect();
    let env_block = spawn::encode_env_block(&env_pairs);

    let result = spawn::spawn(
        resolved.as_os_str(),
        argv0,
        &config.arguments,
        &env_block,
        config.working_directory.as_ref().map(|p| p.as_os_str()),
        &handles,
        config,
    )
    .map_err(Error::from)?;

    platform::sys::pipe::close(result.thread_handle);
    Ok((result.process_handle, result.thread_handle))
}

#[cfg(windows)]
fn child_side_input_handle(source: &InputSource, pipe: Option<&Pipe>) -> Result<RawDescriptor, Error> {
    match source {
        InputSource::None => platform::sys::pipe::open_dev_null(false).map_err(|e| Error::io("open NUL", e)),
        InputSource::FromFileDescriptor { fd, .. } => Ok(*fd),
        _ => pipe.unwrap().read_end()?.ok_or_else(|| {
            Error::io("stdin pipe", std::io::Error::new(std::io::ErrorKind::Other, "pipe read end closed"))
        }),
    }
}

#[cfg(windows)]
fn child_side_output_handle(sink: &OutputSink, pipe: Option<&Pipe>) -> Result<RawDescriptor, Error> {
    match sink {
        OutputSink::Discard => platform::sys::pipe::open_dev_null(true).map_err(|e| Error::io("open NUL", e)),
        OutputSink::ToFileDescriptor { fd, .. } => Ok(*fd),
        _ => pipe.unwrap().write_end()?.ok_or_else(|| {
            Error::io("output pipe", std::io::Error::new(std::io::ErrorKind::Other, "pipe write end closed"))
        }),
    }
}

/// Only a bare name goes through PATH search and can fail here with
/// `ExecutableNotResolvable`. A literal path — `Executable::Path`, or an
/// `Executable::Name` that already contains a separator — bypasses
/// resolution entirely (§4.5 step 2, §6): it is handed to the spawn
/// syscall as-is and a missing/inaccessible file surfaces as
/// `SpawnFailed{ENOENT}` from `execve`/`CreateProcessW` itself.
fn resolve_executable(executable: &Executable, path_hint: Option<&OsStr>) -> Result<PathBuf, Error> {
    match executable {
        Executable::Path(path) => Ok(path.clone()),
        Executable::Name(name) => {
            if executable.is_literal_path() {
                Ok(PathBuf::from(name))
            } else {
                platform::sys::util::search_path(name, path_hint)
                    .ok_or_else(|| Error::ExecutableNotResolvable { name: name.clone() })
            }
        }
    }
}

fn validate_cwd(path: &Path) -> Result<(), Error> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::WorkingDirectoryInvalid { path: path.to_owned() })
    }
}

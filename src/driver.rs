//! Top-level orchestrator (§4.8 `RunDriver`).
//!
//! Opens resources via the [`crate::spawner`], runs the input/output pumps
//! concurrently with a user body and the reaper, and assembles a
//! [`CollectedResult`] — or propagates the first error observed, having
//! already torn the child down.

use crate::{
    config::Configuration,
    error::Error,
    execution::{Execution, ProcessHandle, StdinWriter, Teardown},
    io::{output, InputSource, OutputSink},
    reaper,
    spawner::{self, Spawned},
    status::TerminationStatus,
};
use std::{
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::sync::{mpsc, watch};

/// What a `RunDriver` invocation produced: the termination status, whatever
/// `Collect` sinks captured, and the user body's return value (§4.5 point 4).
#[derive(Debug)]
pub struct CollectedResult<R> {
    pub pid: i64,
    pub termination_status: TerminationStatus,
    pub stdout: Option<output::Captured>,
    pub stderr: Option<output::Captured>,
    pub body_value: R,
}

/// Runs `config` to completion with no user body, collecting stdout/stderr
/// per the given sinks.
pub async fn run(
    config: Configuration,
    stdin: InputSource,
    stdout: OutputSink,
    stderr: OutputSink,
) -> Result<CollectedResult<()>, Error> {
    run_with(config, stdin, stdout, stderr, |_execution| async { Ok(()) }).await
}

/// Like [`run`], but forces POSIX session detachment (new session, no
/// controlling terminal) so the child outlives the caller's process group.
/// On Windows this maps to `ConsoleBehavior::Detached` unless the caller
/// already chose a console behavior.
pub async fn run_detached(
    mut config: Configuration,
    stdin: InputSource,
    stdout: OutputSink,
    stderr: OutputSink,
) -> Result<CollectedResult<()>, Error> {
    config.unix_options.create_new_session = true;
    if config.windows_options.console_behavior == crate::config::ConsoleBehavior::Inherit {
        config.windows_options.console_behavior = crate::config::ConsoleBehavior::Detached;
    }
    run(config, stdin, stdout, stderr).await
}

/// Runs `config`, concurrently driving `body` with a live [`Execution`]
/// view. If `body` returns `Err`, teardown is triggered immediately and
/// that error is the overall result (§4.8 step 3).
pub async fn run_with<F, Fut, R>(
    config: Configuration,
    stdin: InputSource,
    stdout: OutputSink,
    stderr: OutputSink,
    body: F,
) -> Result<CollectedResult<R>, Error>
where
    F: FnOnce(Execution) -> Fut,
    Fut: Future<Output = Result<R, Error>>,
{
    let Spawned { pid, stdin_pipe, stdout_pipe, stderr_pipe } =
        spawner::spawn(&config, &stdin, &stdout, &stderr)?;

    #[cfg(unix)]
    let handle = ProcessHandle { pid };
    #[cfg(windows)]
    let handle = ProcessHandle { pid: pid as u32, process_handle: pid };

    let (status_tx, status_rx) = watch::channel(None);

    // `CustomWriter`/`StreamToConsumer` need a handle the body can drive
    // directly (§4.6), alongside the pipe's own automatic pump.
    let wants_custom_writer = matches!(stdin, InputSource::CustomWriter);
    let wants_stdout_stream = matches!(stdout, OutputSink::StreamToConsumer);
    let wants_stderr_stream = matches!(stderr, OutputSink::StreamToConsumer);

    let stdin_pipe = stdin_pipe.map(Arc::new);
    let stdin_fd = stdin_pipe.as_ref().and_then(|p| p.write_end().ok().flatten());
    let stdout_fd = stdout_pipe.as_ref().and_then(|p| p.read_end().ok().flatten());
    let stderr_fd = stderr_pipe.as_ref().and_then(|p| p.read_end().ok().flatten());

    let stdin_writer = wants_custom_writer
        .then(|| stdin_fd.zip(stdin_pipe.clone()))
        .flatten()
        .map(|(fd, pipe)| StdinWriter { fd, pipe });

    let (stdout_tx, stdout_rx) = wants_stdout_stream
        .then(mpsc::unbounded_channel::<Vec<u8>>)
        .map(|(tx, rx)| (Some(tx), Some(rx)))
        .unwrap_or((None, None));
    let (stderr_tx, stderr_rx) = wants_stderr_stream
        .then(mpsc::unbounded_channel::<Vec<u8>>)
        .map(|(tx, rx)| (Some(tx), Some(rx)))
        .unwrap_or((None, None));

    let execution = Execution::new(
        handle,
        status_rx,
        stdin_writer,
        Arc::new(Mutex::new(stdout_rx)),
        Arc::new(Mutex::new(stderr_rx)),
    );

    let reaper_task = tokio::spawn(async move {
        let status = reaper::wait_for_exit(pid).await;
        if let Ok(status) = &status {
            let _ = status_tx.send(Some(*status));
        }
        status
    });

    let stdin_pump = async move {
        match stdin_fd {
            Some(fd) => stdin.pump(fd).await,
            None => Ok(()),
        }
    };
    let stdout_pump = collect_pump(stdout, stdout_fd, stdout_tx);
    let stderr_pump = collect_pump(stderr, stderr_fd, stderr_tx);

    let body_fut = async move {
        let mut exec_for_teardown = execution.clone();
        let result = body(execution).await;
        if result.is_err() {
            let teardown: Teardown = vec![(crate::signal::Signal::Terminate, Duration::from_millis(200))];
            let _ = exec_for_teardown.teardown(&teardown).await;
        }
        result
    };

    let (stdin_result, stdout_result, stderr_result, body_result, reap_result) =
        tokio::join!(stdin_pump, stdout_pump, stderr_pump, body_fut, reaper_task);

    // Every pump has observed EOF/finished writing by now; drop the pipes
    // to close whichever ends the parent still owned.
    drop(stdin_pipe);
    drop(stdout_pipe);
    drop(stderr_pipe);

    let termination_status = reap_result
        .map_err(|e| Error::io("reaper join", std::io::Error::new(std::io::ErrorKind::Other, e)))??;

    stdin_result?;
    let stdout_captured = stdout_result?;
    let stderr_captured = stderr_result?;
    let body_value = body_result?;

    Ok(CollectedResult {
        pid: handle_pid(handle),
        termination_status,
        stdout: stdout_captured,
        stderr: stderr_captured,
        body_value,
    })
}

#[cfg(unix)]
fn handle_pid(handle: ProcessHandle) -> i64 {
    handle.pid as i64
}

#[cfg(windows)]
fn handle_pid(handle: ProcessHandle) -> i64 {
    handle.pid as i64
}

async fn collect_pump(
    sink: OutputSink,
    fd: Option<crate::platform::RawDescriptor>,
    sender: Option<mpsc::UnboundedSender<Vec<u8>>>,
) -> Result<Option<output::Captured>, Error> {
    match sink {
        OutputSink::Collect { limit, as_ } => {
            let fd = fd.ok_or_else(|| {
                Error::io("output pump", std::io::Error::new(std::io::ErrorKind::Other, "no read end"))
            })?;
            Ok(Some(output::capture(fd, limit, as_).await?))
        }
        OutputSink::StreamToConsumer => {
            let fd = fd.ok_or_else(|| {
                Error::io("output pump", std::io::Error::new(std::io::ErrorKind::Other, "no read end"))
            })?;
            let sender = sender
                .expect("driver always builds a channel before pumping a StreamToConsumer sink");
            output::stream(fd, sender).await?;
            Ok(None)
        }
        OutputSink::Discard | OutputSink::ToFileDescriptor { .. } => Ok(None),
    }
}

//! Live handle to a running child (§4.6 `Execution`).
//!
//! State machine: `Running → (TerminationReceived) → Reaped`. Signals are
//! only valid while `Running`; `termination_status()` becomes `Some` the
//! moment the reaper observes the child's exit, which may race a caller's
//! own `send_signal`/`teardown` call — that's fine, both paths end up
//! agreeing on the same status via the shared watch channel.

use crate::{error::Error, platform::RawDescriptor, signal::Signal, status::TerminationStatus};
use futures_util::Stream;
use std::{
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
    time::Duration,
};
use tokio::sync::{mpsc, watch};

#[cfg(unix)]
#[derive(Clone, Copy)]
pub(crate) struct ProcessHandle {
    pub pid: RawDescriptor,
}

#[cfg(windows)]
#[derive(Clone, Copy)]
pub(crate) struct ProcessHandle {
    pub pid: u32,
    pub process_handle: RawDescriptor,
}

/// A teardown escalation: signals sent in order, each given up to its grace
/// period to take effect, with an unconditional `Kill` as the last resort
/// (§4.6).
pub type Teardown = Vec<(Signal, Duration)>;

/// A live (or just-reaped) child process.
#[derive(Clone)]
pub struct Execution {
    pub(crate) handle: ProcessHandle,
    pub(crate) status: watch::Receiver<Option<TerminationStatus>>,
    pub(crate) stdin_writer: Option<StdinWriter>,
    pub(crate) stdout_receiver: Arc<Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>>,
    pub(crate) stderr_receiver: Arc<Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>>,
}

impl Execution {
    pub(crate) fn new(
        handle: ProcessHandle,
        status: watch::Receiver<Option<TerminationStatus>>,
        stdin_writer: Option<StdinWriter>,
        stdout_receiver: Arc<Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>>,
        stderr_receiver: Arc<Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>>,
    ) -> Self {
        Execution { handle, status, stdin_writer, stdout_receiver, stderr_receiver }
    }

    /// Present only when stdin was configured with
    /// [`crate::io::InputSource::CustomWriter`] (§4.6). The caller drives
    /// writes and must call [`StdinWriter::finish`] once done, or the child
    /// sees its stdin held open for as long as this `Execution` lives.
    pub fn stdin_writer(&self) -> Option<StdinWriter> {
        self.stdin_writer.clone()
    }

    /// Present only when stdout was configured with
    /// [`crate::io::OutputSink::StreamToConsumer`]. Can be taken once; later
    /// calls (or calls from a cloned `Execution`) return `None`.
    pub fn stdout_stream(&self) -> Option<OutputStream> {
        self.stdout_receiver.lock().unwrap().take().map(OutputStream::new)
    }

    /// The stderr counterpart of [`Execution::stdout_stream`].
    pub fn stderr_stream(&self) -> Option<OutputStream> {
        self.stderr_receiver.lock().unwrap().take().map(OutputStream::new)
    }

    #[cfg(unix)]
    pub fn process_id(&self) -> i64 {
        self.handle.pid as i64
    }

    #[cfg(windows)]
    pub fn process_id(&self) -> i64 {
        self.handle.pid as i64
    }

    pub fn termination_status(&self) -> Option<TerminationStatus> {
        *self.status.borrow()
    }

    /// Sends `signal`. `ESRCH`-equivalent ("already gone") is swallowed per
    /// §7's benign-after-exit policy.
    pub fn send_signal(&self, signal: Signal, to_group: bool) -> Result<(), Error> {
        if self.termination_status().is_some() {
            return Ok(());
        }
        let result = send_signal_raw(self.handle, signal, to_group);
        match result {
            Err(e) if e.is_benign_after_exit() => Ok(()),
            other => other,
        }
    }

    async fn wait_reaped(&mut self) -> TerminationStatus {
        loop {
            if let Some(status) = *self.status.borrow() {
                return status;
            }
            if self.status.changed().await.is_err() {
                // Sender side dropped without ever publishing a status;
                // this only happens if the reaper task itself panicked.
                return TerminationStatus::Signaled(0);
            }
        }
    }

    /// Runs an escalation schedule (§4.6 `teardown`), sending each signal
    /// and waiting up to its grace period before moving to the next. Sends
    /// an unconditional `Kill` after the schedule is exhausted.
    pub async fn teardown(&mut self, sequence: &Teardown) -> Result<TerminationStatus, Error> {
        if let Some(status) = self.termination_status() {
            return Ok(status);
        }
        for &(signal, grace) in sequence {
            self.send_signal(signal, false)?;
            if let Ok(status) = tokio::time::timeout(grace, self.wait_reaped()).await {
                return Ok(status);
            }
        }
        self.send_signal(Signal::Kill, false)?;
        Ok(self.wait_reaped().await)
    }
}

#[cfg(unix)]
fn send_signal_raw(handle: ProcessHandle, signal: Signal, to_group: bool) -> Result<(), Error> {
    crate::platform::sys::util::send_signal(handle.pid, signal.to_raw(), to_group)
        .map_err(|e| Error::io("kill", e))
}

#[cfg(windows)]
fn send_signal_raw(handle: ProcessHandle, signal: Signal, to_group: bool) -> Result<(), Error> {
    let _ = to_group;
    match signal.to_console_event() {
        Some(event) => crate::platform::sys::util::send_ctrl_event(handle.pid, event)
            .map_err(|e| Error::io("GenerateConsoleCtrlEvent", e)),
        None if matches!(signal, Signal::Kill) => {
            crate::platform::sys::util::terminate(handle.process_handle)
                .map_err(|e| Error::io("TerminateProcess", e))
        }
        None => Err(Error::UnsupportedOperation {
            what: "this signal has no Windows console-control equivalent",
        }),
    }
}

/// A handle for writing to a [`crate::io::InputSource::CustomWriter`]
/// stdin, returned by [`crate::driver::RunDriver`] to the user body.
#[derive(Clone)]
pub struct StdinWriter {
    pub(crate) fd: RawDescriptor,
    pub(crate) pipe: Arc<crate::pipe::Pipe>,
}

impl StdinWriter {
    pub async fn write(&self, bytes: Vec<u8>) -> Result<(), Error> {
        let fd = self.fd;
        tokio::task::spawn_blocking(move || {
            let mut chunk = bytes.as_slice();
            while !chunk.is_empty() {
                match crate::platform::write_raw(fd, chunk) {
                    Ok(0) => break,
                    Ok(n) => chunk = &chunk[n..],
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => break,
                    Err(e) => return Err(Error::io("stdin write", e)),
                }
            }
            Ok(())
        })
        .await
        .map_err(|e| Error::io("stdin write join", std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    pub fn finish(&self) {
        self.pipe.close_write();
    }
}

/// A live stdout/stderr drain for [`crate::io::OutputSink::StreamToConsumer`],
/// yielding chunks as the pump reads them off the pipe.
pub struct OutputStream {
    receiver: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl OutputStream {
    fn new(receiver: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        OutputStream { receiver }
    }
}

impl Stream for OutputStream {
    type Item = Vec<u8>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

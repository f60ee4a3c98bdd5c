//! Strategies for consuming a child's stdout/stderr (§4.4).

use crate::{encoding::Encoding, error::Error, platform, platform::RawDescriptor};

/// How a captured stream's bytes should be materialized for the caller.
pub enum CollectAs {
    Bytes,
    String(Encoding),
}

/// How the child's stdout/stderr is consumed.
pub enum OutputSink {
    /// Routed to `/dev/null`/`NUL`; the child never blocks writing it.
    Discard,
    /// An fd/HANDLE the caller already owns receives the child's output
    /// directly, bypassing the pump entirely.
    ToFileDescriptor { fd: RawDescriptor, close_after_spawn: bool },
    /// Captured up to `limit` bytes (drain-and-truncate: bytes past the cap
    /// are still read off the pipe so the child never blocks, just dropped).
    Collect { limit: Option<usize>, as_: CollectAs },
    /// The caller drains `stdout_stream()`/`stderr_stream()` manually.
    StreamToConsumer,
}

impl OutputSink {
    pub fn collect_bytes(limit: Option<usize>) -> Self {
        OutputSink::Collect { limit, as_: CollectAs::Bytes }
    }

    pub fn collect_string(limit: Option<usize>, encoding: Encoding) -> Self {
        OutputSink::Collect { limit, as_: CollectAs::String(encoding) }
    }

    pub(crate) fn requires_pump(&self) -> bool {
        !matches!(self, OutputSink::Discard | OutputSink::ToFileDescriptor { .. })
    }
}

/// What a `Collect` sink produced, ready for [`crate::driver::CollectedResult`].
#[derive(Debug)]
pub enum Captured {
    Bytes(Vec<u8>),
    String(Option<String>),
}

/// Reads `read` to EOF, keeping at most `limit` bytes (§4.4: the rest is
/// still drained so the child's write end never blocks on a full pipe).
pub(crate) async fn capture(
    read: RawDescriptor,
    limit: Option<usize>,
    as_: CollectAs,
) -> Result<Captured, Error> {
    let bytes = tokio::task::spawn_blocking(move || drain_blocking(read, limit))
        .await
        .map_err(|e| Error::io("capture join", std::io::Error::new(std::io::ErrorKind::Other, e)))??;
    Ok(match as_ {
        CollectAs::Bytes => Captured::Bytes(bytes),
        CollectAs::String(encoding) => Captured::String(encoding.decode(&bytes)),
    })
}

fn drain_blocking(fd: RawDescriptor, limit: Option<usize>) -> Result<Vec<u8>, Error> {
    let mut kept = Vec::new();
    let mut scratch = [0u8; 8192];
    loop {
        match platform::read_raw(fd, &mut scratch) {
            Ok(0) => return Ok(kept),
            Ok(n) => {
                if let Some(limit) = limit {
                    let remaining = limit.saturating_sub(kept.len());
                    kept.extend_from_slice(&scratch[..n.min(remaining)]);
                } else {
                    kept.extend_from_slice(&scratch[..n]);
                }
            }
            Err(e) => return Err(Error::io("stdout/stderr capture", e)),
        }
    }
}

/// Drains `read` to EOF, forwarding each chunk to `sender` instead of
/// accumulating it — the backing for
/// [`crate::execution::Execution::stdout_stream`]/`stderr_stream`. Keeps
/// draining even once the consumer has dropped its receiver, for the same
/// never-block-the-child reason `drain_blocking` keeps reading past `limit`.
pub(crate) async fn stream(
    read: RawDescriptor,
    sender: tokio::sync::mpsc::UnboundedSender<Vec<u8>>,
) -> Result<(), Error> {
    tokio::task::spawn_blocking(move || stream_blocking(read, sender))
        .await
        .map_err(|e| Error::io("stream join", std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

fn stream_blocking(fd: RawDescriptor, sender: tokio::sync::mpsc::UnboundedSender<Vec<u8>>) -> Result<(), Error> {
    let mut scratch = [0u8; 8192];
    loop {
        match platform::read_raw(fd, &mut scratch) {
            Ok(0) => return Ok(()),
            Ok(n) => {
                let _ = sender.send(scratch[..n].to_vec());
            }
            Err(e) => return Err(Error::io("stdout/stderr stream", e)),
        }
    }
}

//! Strategies for supplying a child's stdin (§4.3).

use crate::{encoding::Encoding, error::Error, platform, platform::RawDescriptor};
use futures_util::Stream;
use std::pin::Pin;

type ByteStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;
type ByteIter = Box<dyn Iterator<Item = Vec<u8>> + Send>;

/// How the child's stdin is fed.
pub enum InputSource {
    /// The child reads from `/dev/null`/`NUL`; reads immediately see EOF.
    None,
    /// An fd/HANDLE the caller already owns is duplicated onto the child's
    /// stdin directly, bypassing the pump entirely.
    FromFileDescriptor { fd: RawDescriptor, close_after_spawn: bool },
    /// A fixed in-memory buffer, written in full then the pipe is closed.
    Bytes(Vec<u8>),
    /// A string encoded per `encoding`, then treated like `Bytes`.
    String(String, Encoding),
    /// A chunk iterator, drained synchronously on a pump thread.
    Sequence(ByteIter),
    /// A chunk stream, drained by the async driver as chunks arrive.
    AsyncSequence(ByteStream),
    /// The caller drives stdin manually through [`crate::execution::StdinWriter`].
    CustomWriter,
}

impl InputSource {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        InputSource::Bytes(data.into())
    }

    pub fn text(data: impl Into<String>, encoding: Encoding) -> Self {
        InputSource::String(data.into(), encoding)
    }

    pub(crate) fn requires_pump(&self) -> bool {
        !matches!(self, InputSource::None | InputSource::FromFileDescriptor { .. })
    }

    /// Drains this source into the write end of the child's stdin pipe.
    /// `CustomWriter` has nothing to drain here: the pipe's write end is
    /// driven directly through the `StdinWriter` the driver hands to the
    /// caller's body (§4.6), so this arm only has to get out of the way.
    pub(crate) async fn pump(self, write: RawDescriptor) -> Result<(), Error> {
        match self {
            InputSource::None
            | InputSource::FromFileDescriptor { .. }
            | InputSource::CustomWriter => Ok(()),
            InputSource::Bytes(data) => write_all_blocking(write, data).await,
            InputSource::String(text, encoding) => write_all_blocking(write, encoding.encode(&text)).await,
            InputSource::Sequence(mut iter) => {
                tokio::task::spawn_blocking(move || -> Result<(), Error> {
                    while let Some(chunk) = iter.next() {
                        write_chunk_blocking(write, &chunk)?;
                    }
                    Ok(())
                })
                .await
                .map_err(join_error)??;
                Ok(())
            }
            InputSource::AsyncSequence(mut stream) => {
                use futures_util::StreamExt;
                while let Some(chunk) = stream.next().await {
                    write_all_blocking(write, chunk).await?;
                }
                Ok(())
            }
        }
    }
}

fn join_error(e: tokio::task::JoinError) -> Error {
    Error::io("pump join", std::io::Error::new(std::io::ErrorKind::Other, e))
}

async fn write_all_blocking(write: RawDescriptor, data: Vec<u8>) -> Result<(), Error> {
    tokio::task::spawn_blocking(move || write_chunk_blocking(write, &data))
        .await
        .map_err(join_error)?
}

fn write_chunk_blocking(fd: RawDescriptor, mut chunk: &[u8]) -> Result<(), Error> {
    while !chunk.is_empty() {
        match platform::write_raw(fd, chunk) {
            Ok(0) => break,
            Ok(n) => chunk = &chunk[n..],
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => break,
            Err(e) => return Err(Error::io("stdin pump", e)),
        }
    }
    Ok(())
}

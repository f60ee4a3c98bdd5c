//! Cross-platform owned pipe (§3, §4.2).
//!
//! A [`Pipe`] starts with no OS resources at all. The first access that
//! needs either end lazily creates the underlying platform pipe; after
//! that, each end can be closed independently and idempotently without
//! affecting its sibling, and dropping the `Pipe` closes whatever ends are
//! still open.

use crate::{
    error::Error,
    platform::{self, RawDescriptor},
};
use std::sync::Mutex;

enum State {
    Unopened,
    Open { read: RawDescriptor, write: RawDescriptor },
    ReadOnly(RawDescriptor),
    WriteOnly(RawDescriptor),
    Closed,
}

/// A lazily-created, independently-closable pipe shared between the
/// spawner (which hands one end to the child) and the execution handle
/// (which keeps the other end for the parent side).
pub struct Pipe {
    state: Mutex<State>,
}

impl Pipe {
    pub fn new() -> Self {
        Pipe { state: Mutex::new(State::Unopened) }
    }

    fn ensure_open(&self) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        if let State::Unopened = *state {
            let (read, write) =
                platform::sys::pipe::create().map_err(|e| Error::io("pipe create", e))?;
            *state = State::Open { read, write };
        }
        Ok(())
    }

    /// The read end, creating the pipe if this is the first access. Returns
    /// `None` if the read end has already been closed.
    pub(crate) fn read_end(&self) -> Result<Option<RawDescriptor>, Error> {
        self.ensure_open()?;
        let state = self.state.lock().unwrap();
        Ok(match *state {
            State::Open { read, .. } | State::ReadOnly(read) => Some(read),
            State::WriteOnly(_) | State::Closed | State::Unopened => None,
        })
    }

    pub(crate) fn write_end(&self) -> Result<Option<RawDescriptor>, Error> {
        self.ensure_open()?;
        let state = self.state.lock().unwrap();
        Ok(match *state {
            State::Open { write, .. } | State::WriteOnly(write) => Some(write),
            State::ReadOnly(_) | State::Closed | State::Unopened => None,
        })
    }

    /// Idempotent: closing an already-closed end is a no-op, and never
    /// touches the sibling end (§4.2 edge case).
    pub fn close_read(&self) {
        let mut state = self.state.lock().unwrap();
        *state = match std::mem::replace(&mut *state, State::Closed) {
            State::Open { read, write } => {
                platform::close_raw(read);
                State::WriteOnly(write)
            }
            State::ReadOnly(read) => {
                platform::close_raw(read);
                State::Closed
            }
            other @ (State::WriteOnly(_) | State::Closed | State::Unopened) => other,
        };
    }

    pub fn close_write(&self) {
        let mut state = self.state.lock().unwrap();
        *state = match std::mem::replace(&mut *state, State::Closed) {
            State::Open { read, write } => {
                platform::close_raw(write);
                State::ReadOnly(read)
            }
            State::WriteOnly(write) => {
                platform::close_raw(write);
                State::Closed
            }
            other @ (State::ReadOnly(_) | State::Closed | State::Unopened) => other,
        };
    }
}

impl Default for Pipe {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Pipe {
    fn drop(&mut self) {
        let state = self.state.lock().unwrap();
        match *state {
            State::Open { read, write } => {
                platform::close_raw(read);
                platform::close_raw(write);
            }
            State::ReadOnly(fd) | State::WriteOnly(fd) => platform::close_raw(fd),
            State::Closed | State::Unopened => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazily_creates_and_independently_closes() {
        let pipe = Pipe::new();
        let read = pipe.read_end().unwrap().expect("read end present");
        let write = pipe.write_end().unwrap().expect("write end present");
        assert_ne!(read, write);

        pipe.close_write();
        assert!(pipe.write_end().unwrap().is_none());
        // Closing write must not affect read.
        let state = pipe.state.lock().unwrap();
        assert!(matches!(*state, State::ReadOnly(_)));
    }

    #[test]
    fn double_close_is_a_no_op() {
        let pipe = Pipe::new();
        pipe.read_end().unwrap();
        pipe.close_read();
        pipe.close_read();
    }
}

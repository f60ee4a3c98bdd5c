/*!
 * Cross-platform subprocess execution with owned pipes and concurrent byte
 * pumps.
 *
 * A [`Command`] accumulates an executable, arguments, environment and
 * platform-specific options, plus how its stdin/stdout/stderr should be
 * handled, and hands them to the driver in [`driver`]. The lower layers
 * ([`config`], [`env`], [`pipe`], [`platform`]) stay usable directly for
 * callers who want more control than the builder gives.
 *
 * # Platform support
 * POSIX (`fork`+`exec`, `waitpid`) and Windows (`CreateProcessW`,
 * `WaitForSingleObject`) backends share the same public surface; a few
 * options (e.g. [`config::UnixOptions`], [`config::WindowsOptions`]) are
 * only meaningful on one platform and are silently ignored on the other.
 */
mod command;
mod config;
mod driver;
mod encoding;
mod env;
mod error;
mod execution;
mod io;
mod pipe;
mod platform;
mod reaper;
mod signal;
mod spawner;
mod status;

pub use command::Command;
pub use config::{
    ConsoleBehavior, Executable, LogonInfo, PreSpawnHook, UnixOptions, WindowStyle, WindowsOptions,
};
pub use driver::{run, run_detached, run_with, CollectedResult};
pub use encoding::Encoding;
pub use env::Environment;
pub use error::Error;
pub use execution::{Execution, OutputStream, StdinWriter, Teardown};
pub use io::{Captured, CollectAs, InputSource, OutputSink};
pub use pipe::Pipe;
pub use signal::Signal;
pub use status::TerminationStatus;

/// Configuration is re-exported as its own item since [`Command`] is built
/// on top of it and callers may want to construct one directly.
pub use config::Configuration;

pub type Result<T> = std::result::Result<T, Error>;

//! POSIX backend: `fork`+`exec`, `pipe2`, SIGCHLD-driven reaping.

pub(crate) mod error;
pub(crate) mod fd;
pub(crate) mod pipe;
pub(crate) mod spawn;
pub(crate) mod util;
pub(crate) mod wait;

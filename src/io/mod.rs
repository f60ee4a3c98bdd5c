//! Child-facing I/O specification (§3 `InputSource`/`OutputSink`).

mod input;
pub(crate) mod output;

pub use input::InputSource;
pub use output::{Captured, CollectAs, OutputSink};

//! Decoded child-termination status.

/// A child's termination status, decoded from the raw OS wait status.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TerminationStatus {
    /// The child called `exit()`, or its `main` returned, with this code.
    Exited(i32),
    /// The child was killed by this signal number.
    Signaled(i32),
}

impl TerminationStatus {
    pub fn success(self) -> bool {
        matches!(self, TerminationStatus::Exited(0))
    }

    pub fn code(self) -> Option<i32> {
        match self {
            TerminationStatus::Exited(code) => Some(code),
            TerminationStatus::Signaled(_) => None,
        }
    }

    pub fn signal(self) -> Option<i32> {
        match self {
            TerminationStatus::Exited(_) => None,
            TerminationStatus::Signaled(sig) => Some(sig),
        }
    }
}

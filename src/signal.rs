//! Named signal constants exposed to callers.
//!
//! The spec requires interrupt/terminate/suspend/resume/kill/hangup/quit/
//! user1/user2/alarm/window-change as named constants rather than raw
//! integers, so platform-specific numbering stays out of caller code.

/// A signal a caller can send to a running child, or include in a
/// [`crate::execution::Teardown`] escalation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum Signal {
    Interrupt,
    Terminate,
    Suspend,
    Resume,
    Kill,
    Hangup,
    Quit,
    User1,
    User2,
    Alarm,
    WindowChange,
}

impl Signal {
    #[cfg(unix)]
    pub(crate) fn to_raw(self) -> libc::c_int {
        match self {
            Signal::Interrupt => libc::SIGINT,
            Signal::Terminate => libc::SIGTERM,
            Signal::Suspend => libc::SIGSTOP,
            Signal::Resume => libc::SIGCONT,
            Signal::Kill => libc::SIGKILL,
            Signal::Hangup => libc::SIGHUP,
            Signal::Quit => libc::SIGQUIT,
            Signal::User1 => libc::SIGUSR1,
            Signal::User2 => libc::SIGUSR2,
            Signal::Alarm => libc::SIGALRM,
            Signal::WindowChange => libc::SIGWINCH,
        }
    }

    /// Whether Windows can express this as a console-control event at all.
    /// Only interrupt/terminate map onto `CTRL_C_EVENT`/`CTRL_BREAK_EVENT`;
    /// everything else is [`crate::Error::UnsupportedOperation`] there.
    #[cfg(windows)]
    pub(crate) fn to_console_event(self) -> Option<u32> {
        match self {
            Signal::Interrupt => Some(winapi::um::wincon::CTRL_C_EVENT),
            Signal::Terminate => Some(winapi::um::wincon::CTRL_BREAK_EVENT),
            _ => None,
        }
    }
}

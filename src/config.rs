//! Immutable process configuration (§3 `Configuration`).

use crate::env::Environment;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Either a bare name to resolve against PATH, or a literal path that
/// bypasses resolution entirely.
#[derive(Debug, Clone)]
pub enum Executable {
    Name(OsString),
    Path(PathBuf),
}

impl Executable {
    pub fn name(name: impl Into<OsString>) -> Self {
        Executable::Name(name.into())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Executable::Path(path.into())
    }

    pub(crate) fn is_literal_path(&self) -> bool {
        match self {
            Executable::Path(_) => true,
            Executable::Name(name) => Path::new(name).components().count() > 1,
        }
    }
}

/// A C-callable hook with no captured state, run between `fork` and `exec`
/// on POSIX. Must be async-signal-safe: only the limited set of syscalls
/// the platform documents as safe after `fork` in a multi-threaded process.
pub type PreSpawnHook = unsafe extern "C" fn() -> i32;

/// POSIX-only knobs. Ignored (but still present, for a portable
/// [`Configuration`]) when spawning on Windows.
#[derive(Debug, Clone, Default)]
pub struct UnixOptions {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub supplementary_groups: Option<Vec<u32>>,
    /// `None`: inherit the parent's process group. `Some(0)`: the child
    /// becomes its own group leader. `Some(pgid)`: join that group.
    pub process_group: Option<u32>,
    pub create_new_session: bool,
    pub pre_spawn_hook: Option<PreSpawnHook>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ConsoleBehavior {
    Inherit,
    NewConsole,
    NoWindow,
    Detached,
}

impl Default for ConsoleBehavior {
    fn default() -> Self {
        ConsoleBehavior::Inherit
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WindowStyle {
    Normal,
    Hidden,
    Minimized,
    Maximized,
}

impl Default for WindowStyle {
    fn default() -> Self {
        WindowStyle::Normal
    }
}

#[derive(Debug, Clone)]
pub struct LogonInfo {
    pub username: OsString,
    pub domain: Option<OsString>,
    pub password: OsString,
}

/// Windows-only knobs. Ignored (but still present) when spawning on POSIX.
#[derive(Debug, Clone, Default)]
pub struct WindowsOptions {
    pub console_behavior: ConsoleBehavior,
    pub window_style: WindowStyle,
    pub logon: Option<LogonInfo>,
    pub create_process_group: bool,
}

/// Immutable description of a process to spawn.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub executable: Executable,
    pub arguments: Vec<OsString>,
    pub argv0_override: Option<OsString>,
    pub environment: Environment,
    pub working_directory: Option<PathBuf>,
    pub unix_options: UnixOptions,
    pub windows_options: WindowsOptions,
}

impl Configuration {
    pub fn new(executable: Executable) -> Self {
        Configuration {
            executable,
            arguments: Vec::new(),
            argv0_override: None,
            environment: Environment::Inherit,
            working_directory: None,
            unix_options: UnixOptions::default(),
            windows_options: WindowsOptions::default(),
        }
    }
}

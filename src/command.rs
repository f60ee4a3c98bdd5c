//! Ergonomic builder over [`Configuration`] plus I/O specs (§4.8.1).
//!
//! Owns no OS resources itself — it just accumulates fields and hands them
//! to [`crate::driver::run`]/[`crate::driver::run_with`] on `spawn`.

use crate::{
    config::{Configuration, Executable, UnixOptions, WindowsOptions},
    driver::{self, CollectedResult},
    encoding::Encoding,
    env::Environment,
    error::Error,
    execution::Execution,
    io::{InputSource, OutputSink},
};
use std::{collections::HashMap, ffi::OsStr, future::Future, path::Path};

/// Builds up a [`Configuration`] and I/O specification one call at a time.
pub struct Command {
    configuration: Configuration,
    stdin: InputSource,
    stdout: OutputSink,
    stderr: OutputSink,
}

impl Command {
    pub fn new(executable: impl AsRef<OsStr>) -> Self {
        Command {
            configuration: Configuration::new(Executable::name(executable.as_ref().to_owned())),
            stdin: InputSource::None,
            stdout: OutputSink::Discard,
            stderr: OutputSink::Discard,
        }
    }

    pub fn path(path: impl AsRef<Path>) -> Self {
        Command {
            configuration: Configuration::new(Executable::path(path.as_ref().to_owned())),
            stdin: InputSource::None,
            stdout: OutputSink::Discard,
            stderr: OutputSink::Discard,
        }
    }

    pub fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.configuration.arguments.push(arg.as_ref().to_owned());
        self
    }

    pub fn args(&mut self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> &mut Self {
        self.configuration.arguments.extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    pub fn argv0(&mut self, argv0: impl AsRef<OsStr>) -> &mut Self {
        self.configuration.argv0_override = Some(argv0.as_ref().to_owned());
        self
    }

    pub fn env(&mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> &mut Self {
        let overrides = match &mut self.configuration.environment {
            Environment::InheritWithOverrides(map) => map,
            other => {
                *other = Environment::InheritWithOverrides(HashMap::new());
                match other {
                    Environment::InheritWithOverrides(map) => map,
                    _ => unreachable!(),
                }
            }
        };
        overrides.insert(key.as_ref().to_owned(), value.as_ref().to_owned());
        self
    }

    pub fn env_clear(&mut self) -> &mut Self {
        self.configuration.environment = Environment::Custom(HashMap::new());
        self
    }

    pub fn environment(&mut self, environment: Environment) -> &mut Self {
        self.configuration.environment = environment;
        self
    }

    pub fn current_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.configuration.working_directory = Some(dir.as_ref().to_owned());
        self
    }

    pub fn unix(&mut self, options: UnixOptions) -> &mut Self {
        self.configuration.unix_options = options;
        self
    }

    pub fn windows(&mut self, options: WindowsOptions) -> &mut Self {
        self.configuration.windows_options = options;
        self
    }

    pub fn stdin(&mut self, source: InputSource) -> &mut Self {
        self.stdin = source;
        self
    }

    pub fn stdin_bytes(&mut self, data: impl Into<Vec<u8>>) -> &mut Self {
        self.stdin = InputSource::bytes(data);
        self
    }

    pub fn stdin_text(&mut self, data: impl Into<String>, encoding: Encoding) -> &mut Self {
        self.stdin = InputSource::text(data, encoding);
        self
    }

    pub fn stdout(&mut self, sink: OutputSink) -> &mut Self {
        self.stdout = sink;
        self
    }

    pub fn stderr(&mut self, sink: OutputSink) -> &mut Self {
        self.stderr = sink;
        self
    }

    /// Captures both stdout and stderr as bytes up to `limit`, the most
    /// common case.
    pub fn capture_output(&mut self, limit: Option<usize>) -> &mut Self {
        self.stdout = OutputSink::collect_bytes(limit);
        self.stderr = OutputSink::collect_bytes(limit);
        self
    }

    pub async fn spawn(&mut self) -> Result<CollectedResult<()>, Error> {
        let configuration = std::mem::replace(&mut self.configuration, Configuration::new(Executable::name("")));
        let stdin = std::mem::replace(&mut self.stdin, InputSource::None);
        let stdout = std::mem::replace(&mut self.stdout, OutputSink::Discard);
        let stderr = std::mem::replace(&mut self.stderr, OutputSink::Discard);
        driver::run(configuration, stdin, stdout, stderr).await
    }

    pub async fn spawn_with<F, Fut, R>(&mut self, body: F) -> Result<CollectedResult<R>, Error>
    where
        F: FnOnce(Execution) -> Fut,
        Fut: Future<Output = Result<R, Error>>,
    {
        let configuration = std::mem::replace(&mut self.configuration, Configuration::new(Executable::name("")));
        let stdin = std::mem::replace(&mut self.stdin, InputSource::None);
        let stdout = std::mem::replace(&mut self.stdout, OutputSink::Discard);
        let stderr = std::mem::replace(&mut self.stderr, OutputSink::Discard);
        driver::run_with(configuration, stdin, stdout, stderr, body).await
    }

    pub async fn spawn_detached(&mut self) -> Result<CollectedResult<()>, Error> {
        let configuration = std::mem::replace(&mut self.configuration, Configuration::new(Executable::name("")));
        let stdin = std::mem::replace(&mut self.stdin, InputSource::None);
        let stdout = std::mem::replace(&mut self.stdout, OutputSink::Discard);
        let stderr = std::mem::replace(&mut self.stderr, OutputSink::Discard);
        driver::run_detached(configuration, stdin, stdout, stderr).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_arguments() {
        let mut cmd = Command::new("echo");
        cmd.arg("-n").args(["hello", "world"]);
        assert_eq!(cmd.configuration.arguments, vec!["-n", "hello", "world"]);
    }

    #[test]
    fn env_promotes_inherit_to_overrides() {
        let mut cmd = Command::new("printenv");
        cmd.env("FOO", "bar");
        match &cmd.configuration.environment {
            Environment::InheritWithOverrides(map) => {
                assert_eq!(map.get(OsStr::new("FOO")).unwrap(), "bar");
            }
            _ => panic!("expected InheritWithOverrides"),
        }
    }
}

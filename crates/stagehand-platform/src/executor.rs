use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use tracing::debug;

use crate::command::Command;
use crate::env::CommandEnv;
use crate::error::{Error, Result};

/// Exit code and output streams of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs a [`Command`] under an explicit environment.
pub trait CommandRunner {
    fn run(&mut self, command: &Command, env: &CommandEnv) -> Result<Captured>;
}

/// Spawns real child processes and waits for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, command: &Command, env: &CommandEnv) -> Result<Captured> {
        let mut inner = StdCommand::new(command.get_program());
        inner.args(command.get_args()).env_clear().envs(env.iter());
        if let Some(dir) = command.get_current_dir() {
            inner.current_dir(dir);
        }

        let output = inner.output().map_err(|source| Error::Spawn {
            command: command.to_string(),
            source,
        })?;

        Ok(Captured {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Single choke point for external tool invocations.
///
/// Before each run the staging `bin` directory is put on the search path
/// so helper tools resolve without a full path.
#[derive(Debug)]
pub struct ShellExecutor<R = ProcessRunner> {
    bin_dir: PathBuf,
    env: CommandEnv,
    runner: R,
}

impl ShellExecutor<ProcessRunner> {
    /// Executor over the current process environment.
    pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
        Self::with_runner(bin_dir, CommandEnv::from_process(), ProcessRunner)
    }
}

impl<R: CommandRunner> ShellExecutor<R> {
    pub fn with_runner(bin_dir: impl Into<PathBuf>, env: CommandEnv, runner: R) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            env,
            runner,
        }
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    pub fn env(&self) -> &CommandEnv {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut CommandEnv {
        &mut self.env
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run `command` and capture its output.
    ///
    /// A non-zero exit becomes [`Error::ExitStatus`] carrying the command
    /// line and stderr. Nothing is retried.
    pub fn run(&mut self, command: &Command) -> Result<Captured> {
        self.env.prepend_path(&self.bin_dir)?;

        debug!(command = %command, cwd = ?command.get_current_dir(), "running");
        let captured = self.runner.run(command, &self.env)?;

        if !captured.success() {
            return Err(Error::ExitStatus {
                command: command.to_string(),
                code: captured.code,
                stderr: captured.stderr_lossy(),
            });
        }
        Ok(captured)
    }
}

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use crate::utils::error::{ChainopsError, Result};

/// A subprocess invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    /// Turn a non-zero exit status into an error
    pub check: bool,
    /// Capture stdout instead of inheriting the terminal
    pub capture: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
            check: true,
            capture: false,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn checked(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    #[must_use]
    pub const fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Run through `sh -c`.
    pub fn shell(command: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(command)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words = vec![self.program.as_str()];
        words.extend(self.args.iter().map(String::as_str));
        let quoted = shlex::try_join(words.iter().copied()).unwrap_or_else(|_| words.join(" "));
        f.write_str(&quoted)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub const fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs external programs (docker, git, cargo, dot, ...).
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        tracing::debug!(command = %spec, cwd = ?spec.cwd, "running");

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }
        command.envs(&spec.env);

        let output = if spec.capture {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
        } else {
            command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .output()
        }
        .map_err(|e| {
            ChainopsError::Config(format!("Failed to start '{}': {}", spec.program, e))
        })?;

        let result = CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if spec.check && !result.success() {
            return Err(ChainopsError::Execution {
                program: spec.program.clone(),
                code: result.code,
                stderr: result.stderr,
            });
        }

        Ok(result)
    }
}

/// Runner that records every invocation and answers from a script of
/// canned outputs. Used by tests and `--dry-run` modes.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    responses: Mutex<Vec<(String, CommandOutput)>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next invocation whose rendered command line contains
    /// `needle` with `stdout`.
    pub fn respond(&self, needle: impl Into<String>, stdout: impl Into<String>) {
        self.respond_with(
            needle,
            CommandOutput {
                code: 0,
                stdout: stdout.into(),
                stderr: String::new(),
            },
        );
    }

    pub fn respond_with(&self, needle: impl Into<String>, output: CommandOutput) {
        self.responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((needle.into(), output));
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Rendered command lines, in invocation order.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(spec.clone());

        let rendered = spec.to_string();
        let mut responses = self
            .responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let output = responses
            .iter()
            .position(|(needle, _)| rendered.contains(needle.as_str()))
            .map(|index| responses.remove(index).1)
            .unwrap_or_default();

        if spec.check && !output.success() {
            return Err(ChainopsError::Execution {
                program: spec.program.clone(),
                code: output.code,
                stderr: output.stderr,
            });
        }

        Ok(output)
    }
}

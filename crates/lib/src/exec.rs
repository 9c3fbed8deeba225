//! Running external tools.
//!
//! All process execution goes through [`CommandRunner`] so the build
//! pipeline can be driven by fake tools in tests.

use std::fmt::Display;
use std::process::Command;

use anyhow::Result;
use vbrepo_utils::CommandRunExt;

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// The program to execute, looked up in `$PATH` if not a path.
    pub program: String,
    /// Arguments, not including the program.
    pub args: Vec<String>,
}

impl ToolCommand {
    /// A command with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The value following `flag`, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(|s| s.as_str())
    }

    /// Whether `arg` appears among the arguments.
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl Display for ToolCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_command().to_string_pretty())
    }
}

/// The result of running a [`ToolCommand`] to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` if the process was killed by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes external programs.
pub trait CommandRunner: std::fmt::Debug {
    /// Run `cmd` to completion. An error means the program could not be run
    /// at all; a non-zero exit is reported through [`CommandOutput::code`].
    fn run(&self, cmd: &ToolCommand) -> Result<CommandOutput>;

    /// Run `cmd`, treating a non-zero exit as an error.
    fn run_checked(&self, cmd: &ToolCommand) -> Result<CommandOutput> {
        let out = self.run(cmd)?;
        if !out.success() {
            let code = out
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".into());
            let stderr = out.stderr.trim();
            if stderr.is_empty() {
                anyhow::bail!("Subprocess failed (exit {code}): {cmd}");
            }
            anyhow::bail!("Subprocess failed (exit {code}): {cmd}\n{stderr}");
        }
        Ok(out)
    }
}

/// Runs commands on the host.
#[derive(Debug, Default)]
pub struct HostRunner;

impl CommandRunner for HostRunner {
    fn run(&self, cmd: &ToolCommand) -> Result<CommandOutput> {
        let o = cmd.to_command().log_debug().run_capture_output()?;
        let out = CommandOutput {
            code: o.status.code(),
            stdout: String::from_utf8_lossy(&o.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&o.stderr).into_owned(),
        };
        for line in out.stdout.lines() {
            tracing::debug!("{}: {line}", cmd.program);
        }
        Ok(out)
    }
}

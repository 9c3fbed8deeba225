//! Helpers intended for [`std::process::Command`] and related structures.

use std::process::{Command, Output};

use anyhow::{Context, Result};

/// Helpers intended for [`std::process::Command`].
pub trait CommandRunExt {
    /// Log (at debug level) the full child commandline.
    fn log_debug(&mut self) -> &mut Self;

    /// Execute the child process to completion, capturing stdout and stderr.
    ///
    /// Only a failure to spawn is an error (and it names the command); the
    /// exit status is left to the caller.
    fn run_capture_output(&mut self) -> Result<Output>;

    /// Render the command line the way a shell user would type it.
    fn to_string_pretty(&self) -> String;
}

impl CommandRunExt for Command {
    fn log_debug(&mut self) -> &mut Self {
        // We unconditionally log at trace level, so avoid double logging
        if !tracing::enabled!(tracing::Level::TRACE) {
            tracing::debug!("exec: {}", self.to_string_pretty());
        }
        tracing::trace!("exec: {self:?}");
        self
    }

    fn run_capture_output(&mut self) -> Result<Output> {
        let pretty = self.to_string_pretty();
        self.output()
            .with_context(|| format!("Failed to execute: {pretty}"))
    }

    fn to_string_pretty(&self) -> String {
        std::iter::once(self.get_program())
            .chain(self.get_args())
            .map(|arg| {
                let arg = arg.to_string_lossy();
                shlex::try_quote(&arg)
                    .map(|q| q.into_owned())
                    .unwrap_or_else(|_| format!("{arg:?}"))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

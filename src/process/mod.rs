//! External process invocation for upgrade steps.
//!
//! Every effect of an upgrade (fetching the archive, changing permissions,
//! installing dependencies, running framework console commands) is delegated
//! to an external program. This module provides the narrow capability the
//! runner uses to reach those programs:
//!
//! - [`CommandSpec`] describes *what* to run, either as an argument vector or
//!   as a shell line when pipes or globbing are required.
//! - [`Executor`] runs a command, streams each output line to a callback as it
//!   arrives, and returns the exit status together with every captured line.
//! - [`ProcessExecutor`] is the real implementation on top of
//!   [`tokio::process`].
//!
//! The executor never interprets output; lines are tagged as standard output
//! or standard error and forwarded untouched.

mod executor;

pub use executor::ProcessExecutor;

use anyhow::Result;
use std::fmt;
use std::future::Future;

/// A command to hand to an [`Executor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// Run `program` directly with `args`; no shell is involved.
    Exec {
        /// Program name or path, resolved through `PATH`
        program: String,
        /// Arguments passed verbatim
        args: Vec<String>,
    },
    /// Run a line through `sh -c`. Used for pipelines and glob expansion.
    Shell(String),
}

impl CommandSpec {
    /// Builds an [`CommandSpec::Exec`] from a program and its arguments.
    pub fn exec<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exec {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a [`CommandSpec::Shell`] line.
    pub fn shell(line: impl Into<String>) -> Self {
        Self::Shell(line.into())
    }

    /// Returns true if `needle` appears as a standalone argument.
    ///
    /// Shell lines are split on whitespace for the comparison.
    #[must_use]
    pub fn has_arg(&self, needle: &str) -> bool {
        match self {
            Self::Exec {
                args,
                ..
            } => args.iter().any(|arg| arg == needle),
            Self::Shell(line) => line.split_whitespace().any(|word| word == needle),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exec {
                program,
                args,
            } => {
                write!(f, "{program}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
            Self::Shell(line) => f.write_str(line),
        }
    }
}

/// One line of output produced by an external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    /// A line written to standard output
    Stdout(String),
    /// A line written to standard error
    Stderr(String),
}

impl OutputLine {
    /// The line text without its stream tag.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Stdout(line) | Self::Stderr(line) => line,
        }
    }

    #[must_use]
    pub const fn is_stderr(&self) -> bool {
        matches!(self, Self::Stderr(_))
    }
}

/// Result of running a command to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub status: Option<i32>,
    /// Every line the process emitted, in arrival order
    pub lines: Vec<OutputLine>,
}

impl CommandOutput {
    /// A successful output with no lines.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            status: Some(0),
            lines: Vec::new(),
        }
    }

    /// An output with the given exit code and no lines.
    #[must_use]
    pub const fn exited(code: i32) -> Self {
        Self {
            status: Some(code),
            lines: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    /// Lines written to standard error.
    pub fn stderr(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter(|line| line.is_stderr()).map(OutputLine::text)
    }
}

/// Capability for running external commands.
///
/// Implementations must call `on_line` once per output line, in the order the
/// lines are read, and must also return every line in
/// [`CommandOutput::lines`]. A non-zero exit is reported through
/// [`CommandOutput::status`], not as an `Err`; `Err` is reserved for failures
/// to run the command at all (spawn errors, broken pipes).
pub trait Executor {
    /// Runs `command` to completion.
    fn run(
        &self,
        command: &CommandSpec,
        on_line: &mut dyn FnMut(&OutputLine),
    ) -> impl Future<Output = Result<CommandOutput>>;
}

/// Quotes `value` for safe interpolation into a POSIX shell line.
///
/// The value is wrapped in single quotes; embedded single quotes are closed,
/// escaped and reopened.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

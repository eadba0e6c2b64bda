//! [`Executor`] backed by real child processes.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Split};
use tokio::process::Command;

use super::{CommandOutput, CommandSpec, Executor, OutputLine};

/// Interpreter for [`CommandSpec::Shell`] lines.
const SHELL: &str = "sh";

/// Runs commands as child processes inside an installation directory.
///
/// Standard output and standard error are both piped and read concurrently,
/// so a process that fills one pipe while the other is idle cannot stall.
/// Standard input is closed; commands must not wait for interactive input.
///
/// No timeout is applied. A step runs for as long as its process does.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    working_dir: PathBuf,
}

impl ProcessExecutor {
    /// Creates an executor that runs every command in `working_dir`.
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
        }
    }

    fn build(&self, command: &CommandSpec) -> Command {
        let mut cmd = match command {
            CommandSpec::Exec {
                program,
                args,
            } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            CommandSpec::Shell(line) => {
                let mut cmd = Command::new(SHELL);
                cmd.arg("-c").arg(line);
                cmd
            }
        };

        cmd.current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Executor for ProcessExecutor {
    async fn run(
        &self,
        command: &CommandSpec,
        on_line: &mut dyn FnMut(&OutputLine),
    ) -> Result<CommandOutput> {
        let start = Instant::now();
        tracing::debug!(
            target: "process",
            "Executing command: {} (in {})",
            command,
            self.working_dir.display()
        );

        let mut child = self
            .build(command)
            .spawn()
            .with_context(|| format!("Failed to start `{command}`"))?;

        let stdout = child.stdout.take().context("Child stdout was not captured")?;
        let stderr = child.stderr.take().context("Child stderr was not captured")?;
        let mut stdout = BufReader::new(stdout).split(b'\n');
        let mut stderr = BufReader::new(stderr).split(b'\n');
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut lines = Vec::new();

        while stdout_open || stderr_open {
            let line = tokio::select! {
                next = next_line(&mut stdout), if stdout_open => match next? {
                    Some(text) => Some(OutputLine::Stdout(text)),
                    None => {
                        stdout_open = false;
                        None
                    }
                },
                next = next_line(&mut stderr), if stderr_open => match next? {
                    Some(text) => Some(OutputLine::Stderr(text)),
                    None => {
                        stderr_open = false;
                        None
                    }
                },
            };

            if let Some(line) = line {
                on_line(&line);
                lines.push(line);
            }
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("Failed to wait for `{command}`"))?;

        tracing::debug!(
            target: "process",
            "Command exited with {:?} after {}ms",
            status.code(),
            start.elapsed().as_millis()
        );

        Ok(CommandOutput {
            status: status.code(),
            lines,
        })
    }
}

/// Reads one newline-delimited segment, decoding it lossily.
async fn next_line<R>(reader: &mut Split<BufReader<R>>) -> Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    let Some(bytes) = reader.next_segment().await.context("Failed to read process output")? else {
        return Ok(None);
    };
    let text = String::from_utf8_lossy(&bytes);
    Ok(Some(text.trim_end_matches('\r').to_string()))
}

//! Sequential execution of an [`UpgradePlan`].
//!
//! The runner walks the plan one step at a time. For each step it traces the
//! underlying command, invokes the action through the [`Executor`], forwards
//! every output line to the [`Reporter`] as it arrives, and advances progress
//! when the action succeeds. The first failing step ends the run; nothing after
//! it is attempted and nothing before it is undone.
//!
//! # State machine
//!
//! ```text
//! NotStarted -> Running -> Completed
//!                       \-> Failed
//! ```
//!
//! `Completed` is entered only after the last step succeeds; `Failed` the
//! moment any step reports failure. Both are terminal for that run. Each call
//! to [`UpgradeRunner::run`] is a new run: its state machine starts again from
//! `NotStarted`, and the console context carries over from the previous run.

use std::fmt;

use crate::core::UpgradeError;
use crate::process::{CommandOutput, CommandSpec, Executor, OutputLine};

use super::context::ConsoleContext;
use super::plan::UpgradePlan;
use super::report::Reporter;
use super::step::{StepAction, StepKind, UpgradeStep};

/// Lines of standard output kept as diagnostics when a failing command wrote
/// nothing to standard error.
const STDOUT_TAIL: usize = 20;

/// Per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Failed,
}

impl RunState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A step whose action reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    /// Step name
    pub step: String,
    pub kind: StepKind,
    /// Zero-based position in the plan
    pub index: usize,
    /// Exit code, `None` if the process was killed or never ran
    pub status: Option<i32>,
    /// Set when the action could not be run at all
    pub reason: Option<String>,
    /// Captured diagnostic output
    pub output: Vec<String>,
}

impl StepFailure {
    fn from_output(index: usize, step: &UpgradeStep, output: &CommandOutput) -> Self {
        let mut diagnostics: Vec<String> = output.stderr().map(str::to_string).collect();
        if diagnostics.is_empty() {
            let tail = output.lines.len().saturating_sub(STDOUT_TAIL);
            diagnostics = output.lines[tail..].iter().map(|line| line.text().to_string()).collect();
        }

        Self {
            step: step.name().to_string(),
            kind: step.kind(),
            index,
            status: output.status,
            reason: None,
            output: diagnostics,
        }
    }

    fn from_error(index: usize, step: &UpgradeStep, error: &anyhow::Error) -> Self {
        Self {
            step: step.name().to_string(),
            kind: step.kind(),
            index,
            status: None,
            reason: Some(format!("{error:#}")),
            output: Vec::new(),
        }
    }

    fn status_text(&self) -> String {
        match (&self.reason, self.status) {
            (Some(reason), _) => reason.clone(),
            (None, Some(code)) => format!("exit code {code}"),
            (None, None) => "terminated by signal".to_string(),
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} '{}' failed: {}", self.index + 1, self.step, self.status_text())
    }
}

impl From<StepFailure> for UpgradeError {
    fn from(failure: StepFailure) -> Self {
        let status = failure.status_text();
        Self::StepFailed {
            in_maintenance: failure.kind.runs_in_maintenance(),
            step: failure.step,
            status,
            output: failure.output,
        }
    }
}

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every planned step succeeded
    Completed {
        steps: usize,
    },
    /// A step failed and the run halted there
    Failed(StepFailure),
}

impl RunOutcome {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&StepFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            Self::Completed {
                ..
            } => None,
        }
    }
}

/// Executes upgrade plans step by step.
pub struct UpgradeRunner<E, R> {
    executor: E,
    reporter: R,
    context: ConsoleContext,
    state: RunState,
}

impl<E: Executor, R: Reporter> UpgradeRunner<E, R> {
    /// Creates a runner. `context` is the console bootstrapped before the run.
    pub fn new(executor: E, reporter: R, context: ConsoleContext) -> Self {
        Self {
            executor,
            reporter,
            context,
            state: RunState::NotStarted,
        }
    }

    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// The console context currently injected into console steps.
    #[must_use]
    pub const fn context(&self) -> &ConsoleContext {
        &self.context
    }

    /// Runs `plan` to completion or to its first failing step.
    ///
    /// Starts a new run, so a terminal state left by a previous call is
    /// replaced.
    pub async fn run(&mut self, plan: UpgradePlan) -> RunOutcome {
        let total = plan.len();
        self.state = RunState::Running;
        self.reporter.start(total);
        tracing::info!("Starting upgrade with {} steps", total);

        for (index, step) in plan.into_iter().enumerate() {
            if let Err(failure) = self.run_step(index, &step).await {
                tracing::warn!("Upgrade halted: {}", failure);
                self.state = RunState::Failed;
                let outcome = RunOutcome::Failed(failure);
                self.reporter.finish(&outcome);
                return outcome;
            }
            self.reporter.advance();
        }

        tracing::info!("Upgrade finished after {} steps", total);
        self.state = RunState::Completed;
        let outcome = RunOutcome::Completed {
            steps: total,
        };
        self.reporter.finish(&outcome);
        outcome
    }

    async fn run_step(&mut self, index: usize, step: &UpgradeStep) -> Result<(), StepFailure> {
        let command = self.resolve(step);
        tracing::debug!("Step {} ({}): {}", index + 1, step.name(), command);
        self.reporter.trace(&command.to_string());

        let reporter = &mut self.reporter;
        let mut forward = |line: &OutputLine| reporter.output(line);
        let output = self
            .executor
            .run(&command, &mut forward)
            .await
            .map_err(|error| StepFailure::from_error(index, step, &error))?;

        if !output.is_success() {
            return Err(StepFailure::from_output(index, step, &output));
        }

        if step.needs_rebootstrap() {
            self.context = self
                .context
                .rebootstrap()
                .map_err(|error| StepFailure::from_error(index, step, &error))?;
        }

        Ok(())
    }

    fn resolve(&self, step: &UpgradeStep) -> CommandSpec {
        match step.action() {
            StepAction::Command(command) => command.clone(),
            StepAction::Console {
                command,
                args,
            } => self.context.command(command, args),
        }
    }
}

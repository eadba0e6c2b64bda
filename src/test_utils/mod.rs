//! Test doubles and helpers.
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite. Every double records what it was asked to do so tests
//! can assert on call sequences without spawning processes or touching a
//! terminal.

use anyhow::{Result, bail};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::core::UpgradeError;
use crate::process::{CommandOutput, CommandSpec, Executor, OutputLine};
use crate::prompt::Prompter;
use crate::upgrade::{Reporter, RunOutcome};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`. Does nothing when neither
/// is set.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

type Hook = Arc<dyn Fn(&CommandSpec) + Send + Sync>;

struct Rule {
    needle: String,
    output: CommandOutput,
}

/// An [`Executor`] that records commands instead of running them.
///
/// Commands succeed with no output unless a rule matches. Rules are matched
/// by substring against the rendered command line; the first match wins.
/// Clones share the same recording.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    calls: Arc<Mutex<Vec<String>>>,
    rules: Arc<Mutex<Vec<Rule>>>,
    errors: Arc<Mutex<Vec<String>>>,
    hook: Option<Hook>,
}

impl RecordingExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands containing `needle` exit with `code`.
    #[must_use]
    pub fn fail_on(self, needle: &str, code: i32) -> Self {
        self.respond(needle, CommandOutput::exited(code))
    }

    /// Commands containing `needle` produce `output`.
    #[must_use]
    pub fn respond(self, needle: &str, output: CommandOutput) -> Self {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(Rule {
                needle: needle.to_string(),
                output,
            });
        }
        self
    }

    /// Commands containing `needle` cannot be started at all.
    #[must_use]
    pub fn error_on(self, needle: &str) -> Self {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(needle.to_string());
        }
        self
    }

    /// Runs `hook` for every command before it is recorded.
    #[must_use]
    pub fn with_hook(mut self, hook: impl Fn(&CommandSpec) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Rendered command lines in the order they were run.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl Executor for RecordingExecutor {
    async fn run(
        &self,
        command: &CommandSpec,
        on_line: &mut dyn FnMut(&OutputLine),
    ) -> Result<CommandOutput> {
        if let Some(hook) = &self.hook {
            hook(command);
        }

        let rendered = command.to_string();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(rendered.clone());
        }

        let should_error = self
            .errors
            .lock()
            .map(|errors| errors.iter().any(|needle| rendered.contains(needle.as_str())))
            .unwrap_or(false);
        if should_error {
            bail!("Failed to start `{rendered}`");
        }

        let output = self
            .rules
            .lock()
            .ok()
            .and_then(|rules| {
                rules
                    .iter()
                    .find(|rule| rendered.contains(rule.needle.as_str()))
                    .map(|rule| rule.output.clone())
            })
            .unwrap_or_else(CommandOutput::success);

        for line in &output.lines {
            on_line(line);
        }
        Ok(output)
    }
}

/// A [`Prompter`] that answers from a script and records every question.
///
/// Running out of scripted answers is an error, which makes unexpected
/// prompts fail the test.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    confirms: VecDeque<bool>,
    choices: VecDeque<String>,
    questions: Vec<String>,
}

impl ScriptedPrompter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an answer for the next `confirm`.
    #[must_use]
    pub fn confirm_with(mut self, answer: bool) -> Self {
        self.confirms.push_back(answer);
        self
    }

    /// Queues an answer for the next `choose`.
    #[must_use]
    pub fn choose_with(mut self, answer: &str) -> Self {
        self.choices.push_back(answer.to_string());
        self
    }

    #[must_use]
    pub fn questions(&self) -> &[String] {
        &self.questions
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, question: &str, _default: bool) -> Result<bool, UpgradeError> {
        self.questions.push(question.to_string());
        self.confirms.pop_front().ok_or_else(|| UpgradeError::PromptError {
            reason: format!("unexpected confirm: {question}"),
        })
    }

    fn choose(&mut self, question: &str, _options: &[&str]) -> Result<String, UpgradeError> {
        self.questions.push(question.to_string());
        self.choices.pop_front().ok_or_else(|| UpgradeError::PromptError {
            reason: format!("unexpected choose: {question}"),
        })
    }
}

/// Everything a [`RecordingReporter`] saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportLog {
    pub total: Option<usize>,
    pub traces: Vec<String>,
    pub output: Vec<OutputLine>,
    pub advances: usize,
    pub finished: Option<RunOutcome>,
}

/// A [`Reporter`] that records events. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    log: Arc<Mutex<ReportLog>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn log(&self) -> ReportLog {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn with(&self, f: impl FnOnce(&mut ReportLog)) {
        if let Ok(mut log) = self.log.lock() {
            f(&mut log);
        }
    }
}

impl Reporter for RecordingReporter {
    fn start(&mut self, total: usize) {
        self.with(|log| log.total = Some(total));
    }

    fn trace(&mut self, command: &str) {
        self.with(|log| log.traces.push(command.to_string()));
    }

    fn output(&mut self, line: &OutputLine) {
        self.with(|log| log.output.push(line.clone()));
    }

    fn advance(&mut self) {
        self.with(|log| log.advances += 1);
    }

    fn finish(&mut self, outcome: &RunOutcome) {
        self.with(|log| log.finished = Some(outcome.clone()));
    }
}

//! Progress reporting for upgrade runs.

use colored::Colorize;

use crate::process::OutputLine;
use crate::utils::progress::ProgressBar;

use super::runner::RunOutcome;

/// Prefix printed before each traced command.
pub const TRACE_PREFIX: &str = "$upgrader>";

/// Receives progress events from the runner.
///
/// The runner calls [`start`](Reporter::start) once, then for every step
/// [`trace`](Reporter::trace), any number of [`output`](Reporter::output)
/// calls, and [`advance`](Reporter::advance) when the step succeeded.
/// [`finish`](Reporter::finish) is always called last.
pub trait Reporter {
    fn start(&mut self, total: usize);

    /// Announces the command a step is about to run.
    fn trace(&mut self, command: &str);

    fn output(&mut self, line: &OutputLine);

    fn advance(&mut self);

    fn finish(&mut self, outcome: &RunOutcome);
}

/// Terminal reporter with a progress bar.
///
/// Traces and process output are printed above the bar; the bar is suspended
/// while a line is written so the two never interleave.
pub struct ProgressReporter {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// `enabled = false` hides the bar but still prints traces and output.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: None,
        }
    }

    fn print(&self, line: &str, to_stderr: bool) {
        let write = || {
            if to_stderr {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        };
        match &self.bar {
            Some(bar) => bar.suspend(write),
            None => write(),
        }
    }
}

impl Reporter for ProgressReporter {
    fn start(&mut self, total: usize) {
        let bar = if self.enabled {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        bar.set_prefix("Upgrading");
        self.bar = Some(bar);
    }

    fn trace(&mut self, command: &str) {
        self.print(&format!("{} {}", TRACE_PREFIX.cyan(), command), false);
    }

    fn output(&mut self, line: &OutputLine) {
        match line {
            OutputLine::Stdout(text) => self.print(text, false),
            OutputLine::Stderr(text) => self.print(&text.red().to_string(), true),
        }
    }

    fn advance(&mut self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn finish(&mut self, outcome: &RunOutcome) {
        let Some(bar) = self.bar.take() else {
            return;
        };
        match outcome {
            RunOutcome::Completed {
                ..
            } => bar.finish_and_clear(),
            RunOutcome::Failed(_) => bar.abandon(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_reporter_accepts_full_lifecycle() {
        let mut reporter = ProgressReporter::new(false);
        reporter.start(2);
        reporter.trace("php artisan down");
        reporter.output(&OutputLine::Stdout("Application is now in maintenance mode.".to_string()));
        reporter.advance();
        reporter.advance();
        assert_eq!(reporter.bar.as_ref().map(ProgressBar::position), Some(2));
        reporter.finish(&RunOutcome::Completed {
            steps: 2,
        });
        assert!(reporter.bar.is_none());
    }

    #[test]
    fn test_finish_without_start_is_noop() {
        let mut reporter = ProgressReporter::new(true);
        reporter.finish(&RunOutcome::Completed {
            steps: 0,
        });
    }
}

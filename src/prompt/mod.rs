//! Operator prompts.
//!
//! Interactive questions are asked through the [`Prompter`] capability so the
//! upgrade flow can be driven by a script in tests and skipped entirely in
//! non-interactive runs. [`TerminalPrompter`] is the real implementation.

use dialoguer::{Confirm, Input};

use crate::core::UpgradeError;

/// Asks the operator questions.
pub trait Prompter {
    /// Asks a yes/no question; `default` is used when the operator just
    /// presses enter.
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool, UpgradeError>;

    /// Asks for a free-form answer, offering `options` as suggestions. The
    /// first option is the default.
    fn choose(&mut self, question: &str, options: &[&str]) -> Result<String, UpgradeError>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool, UpgradeError> {
        Ok(Confirm::new().with_prompt(question).default(default).interact()?)
    }

    fn choose(&mut self, question: &str, options: &[&str]) -> Result<String, UpgradeError> {
        let prompt = if options.is_empty() {
            question.to_string()
        } else {
            format!("{question} [{}]", options.join(", "))
        };

        let mut input = Input::<String>::new().with_prompt(prompt);
        if let Some(first) = options.first() {
            input = input.default((*first).to_string());
        }
        Ok(input.interact_text()?)
    }
}

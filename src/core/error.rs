//! Error handling for panelup
//!
//! Errors are modelled in two layers, the same way throughout the crate:
//!
//! - [`UpgradeError`] is the strongly-typed taxonomy of things that can go
//!   wrong during an upgrade run. Library code returns it directly or wraps it
//!   in [`anyhow::Error`] when extra `.context(...)` is useful.
//! - [`ErrorContext`] decorates an [`UpgradeError`] with operator-facing
//!   details and a suggestion, and knows how to print itself in colour.
//!
//! [`user_friendly_error`] is the bridge between the two: `main` hands it the
//! final [`anyhow::Error`] of a failed command and prints the result.
//!
//! # Step failures
//!
//! Only one runtime failure is modelled for the upgrade itself:
//! [`UpgradeError::StepFailed`]. It carries the output the failing process
//! produced so the operator sees exactly what the collaborator reported. There
//! is no retry and no rollback; the suggestion printed for a step failure says
//! whether the application was left in maintenance mode.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The error taxonomy for upgrade runs.
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// An upgrade step's external action reported failure
    #[error("Upgrade step '{step}' failed ({status})")]
    StepFailed {
        /// Human-readable step name
        step: String,
        /// Rendered exit status, e.g. `exit code 1`
        status: String,
        /// Diagnostic output captured from the failing action
        output: Vec<String>,
        /// Whether the application was already placed in maintenance mode
        in_maintenance: bool,
    },

    /// The operator name for file ownership is not a valid system user name
    #[error("Invalid user name: '{user}'")]
    InvalidUser {
        /// The rejected name
        user: String,
    },

    /// `--release` was not a semantic version
    #[error("Invalid release version: '{release}'")]
    InvalidRelease {
        /// The rejected version string
        release: String,
    },

    /// The settings file is structurally valid TOML but semantically wrong
    #[error("Configuration error: {message}")]
    ConfigError {
        /// What was wrong
        message: String,
    },

    /// Reading an answer from the terminal failed
    #[error("Prompt failed: {reason}")]
    PromptError {
        /// Underlying terminal error
        reason: String,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("{message}")]
    Other {
        message: String,
    },
}

impl From<dialoguer::Error> for UpgradeError {
    fn from(error: dialoguer::Error) -> Self {
        Self::PromptError {
            reason: error.to_string(),
        }
    }
}

/// An [`UpgradeError`] decorated for display to the operator.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UpgradeError,
    /// Optional actionable hint, printed in green
    pub suggestion: Option<String>,
    /// Optional extra information, printed in yellow
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: UpgradeError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Prints the error, details and suggestion to stderr.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Converts any error into an [`ErrorContext`] with operator guidance.
///
/// Known [`UpgradeError`] variants get tailored suggestions. IO errors are
/// classified by kind. Anything else is rendered with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let error = match error.downcast::<UpgradeError>() {
        Ok(upgrade_error) => return create_error_context(upgrade_error),
        Err(error) => error,
    };

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(UpgradeError::Other {
                    message: error.to_string(),
                })
                .with_suggestion(
                    "Run the upgrade as a user allowed to modify the installation (usually root)",
                );
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(UpgradeError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check that --path points at the panel installation directory");
            }
            _ => {}
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(UpgradeError::Other {
        message,
    })
}

fn create_error_context(error: UpgradeError) -> ErrorContext {
    match error {
        UpgradeError::StepFailed {
            step,
            status,
            output,
            in_maintenance,
        } => {
            let suggestion = if in_maintenance {
                "The panel is still in maintenance mode. Fix the problem above and re-run the \
                 upgrade with --skip-download, or run 'php artisan up' to bring it back online"
            } else {
                "No changes were made to the running panel. Fix the problem above and run the \
                 upgrade again"
            };
            let details = (!output.is_empty()).then(|| output.join("\n"));
            let mut context = ErrorContext::new(UpgradeError::StepFailed {
                step,
                status,
                output,
                in_maintenance,
            })
            .with_suggestion(suggestion);
            if let Some(details) = details {
                context = context.with_details(details);
            }
            context
        }
        UpgradeError::InvalidUser {
            user,
        } => ErrorContext::new(UpgradeError::InvalidUser {
            user,
        })
        .with_suggestion("Pass the web server user with --user, e.g. --user=www-data")
        .with_details(
            "User names must start with a lowercase letter or underscore and contain only \
             lowercase letters, digits, '_' or '-'",
        ),
        UpgradeError::InvalidRelease {
            release,
        } => ErrorContext::new(UpgradeError::InvalidRelease {
            release,
        })
        .with_suggestion("Use a version number such as --release=1.11.3, or pass --url instead"),
        UpgradeError::ConfigError {
            message,
        } => ErrorContext::new(UpgradeError::ConfigError {
            message,
        })
        .with_suggestion("Check ~/.panelup/config.toml or the file passed with --config"),
        UpgradeError::TomlError(error) => ErrorContext::new(UpgradeError::TomlError(error))
            .with_suggestion("Check the TOML syntax of the settings file"),
        UpgradeError::PromptError {
            reason,
        } => ErrorContext::new(UpgradeError::PromptError {
            reason,
        })
        .with_suggestion("Re-run with --no-interaction and pass --user explicitly"),
        other => ErrorContext::new(other),
    }
}

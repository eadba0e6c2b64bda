//! The unit of work in an upgrade plan.

use std::fmt;

use crate::process::CommandSpec;

/// Identifies which of the fixed upgrade steps a [`UpgradeStep`] is.
///
/// The declaration order here is the execution order of a full plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepKind {
    /// Fetch the release archive and unpack it over the installation
    Download,
    /// Put the application into maintenance mode
    MaintenanceOn,
    /// Make the writable directories accessible again
    FixPermissions,
    /// Install application dependencies
    InstallDependencies,
    /// Clear compiled views
    ClearViewCache,
    /// Clear the cached configuration
    ClearConfigCache,
    /// Apply pending migrations and seed data
    Migrate,
    /// Hand every file back to the web server user
    RestoreOwnership,
    /// Signal queue workers to restart
    RestartWorkers,
    /// Take the application out of maintenance mode
    MaintenanceOff,
}

impl StepKind {
    /// Every kind in execution order.
    pub const ALL: [Self; 10] = [
        Self::Download,
        Self::MaintenanceOn,
        Self::FixPermissions,
        Self::InstallDependencies,
        Self::ClearViewCache,
        Self::ClearConfigCache,
        Self::Migrate,
        Self::RestoreOwnership,
        Self::RestartWorkers,
        Self::MaintenanceOff,
    ];

    /// Default human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Download => "Download and unpack release archive",
            Self::MaintenanceOn => "Enable maintenance mode",
            Self::FixPermissions => "Fix storage and cache permissions",
            Self::InstallDependencies => "Install dependencies",
            Self::ClearViewCache => "Clear view cache",
            Self::ClearConfigCache => "Clear config cache",
            Self::Migrate => "Run database migrations",
            Self::RestoreOwnership => "Restore file ownership",
            Self::RestartWorkers => "Restart queue workers",
            Self::MaintenanceOff => "Disable maintenance mode",
        }
    }

    /// True once the application has been taken offline by an earlier step.
    ///
    /// A failure of a step for which this holds leaves the panel in
    /// maintenance mode.
    #[must_use]
    pub fn runs_in_maintenance(self) -> bool {
        self > Self::MaintenanceOn
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a step does when the runner invokes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Run an external command through the executor
    Command(CommandSpec),
    /// Run a framework console sub-command (`artisan <command> <args>`)
    /// through the current console context
    Console {
        command: String,
        args: Vec<String>,
    },
}

/// A named, ordered unit of upgrade work.
///
/// Steps are constructed once while building a plan and never change
/// afterwards; all fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeStep {
    name: String,
    kind: StepKind,
    skippable: bool,
    rebootstrap: bool,
    action: StepAction,
}

impl UpgradeStep {
    /// A step that runs an external command.
    #[must_use]
    pub fn command(kind: StepKind, command: CommandSpec) -> Self {
        Self::new(kind, StepAction::Command(command))
    }

    /// A step that runs a framework console sub-command.
    pub fn console<I, S>(kind: StepKind, command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            kind,
            StepAction::Console {
                command: command.into(),
                args: args.into_iter().map(Into::into).collect(),
            },
        )
    }

    fn new(kind: StepKind, action: StepAction) -> Self {
        Self {
            name: kind.label().to_string(),
            kind,
            skippable: false,
            rebootstrap: false,
            action,
        }
    }

    /// Marks the step as one that run configuration may omit.
    #[must_use]
    pub const fn skippable(mut self) -> Self {
        self.skippable = true;
        self
    }

    /// Requests a fresh console context once this step succeeds.
    #[must_use]
    pub const fn rebootstrap(mut self) -> Self {
        self.rebootstrap = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> StepKind {
        self.kind
    }

    #[must_use]
    pub const fn is_skippable(&self) -> bool {
        self.skippable
    }

    #[must_use]
    pub const fn needs_rebootstrap(&self) -> bool {
        self.rebootstrap
    }

    #[must_use]
    pub const fn action(&self) -> &StepAction {
        &self.action
    }
}

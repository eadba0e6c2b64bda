//! panelup - in-place upgrades for a Pterodactyl panel installation
//!
//! An upgrade is a fixed, ordered sequence of external commands: download and
//! unpack the release archive, enter maintenance mode, fix permissions,
//! install dependencies, clear caches, migrate the database, restore file
//! ownership, restart queue workers and leave maintenance mode. Steps run
//! strictly one after another and the first failure halts the run. Nothing is
//! rolled back.
//!
//! # Architecture Overview
//!
//! - The CLI resolves the archive URL and the web server user, optionally
//!   asking the operator through a [`prompt::Prompter`].
//! - [`upgrade::build_plan`] turns a [`upgrade::RunConfiguration`] into an
//!   [`upgrade::UpgradePlan`].
//! - [`upgrade::UpgradeRunner`] executes the plan through a
//!   [`process::Executor`], forwarding output to a [`upgrade::Reporter`].
//!
//! # Core Modules
//!
//! - [`cli`] - command-line interface
//! - [`config`] - the optional settings file (`~/.panelup/config.toml`)
//! - [`core`] - error types and operator-facing error rendering
//! - [`process`] - running external commands with streamed output
//! - [`prompt`] - operator questions
//! - [`upgrade`] - steps, plans, the console context and the runner
//! - [`users`] - web server user detection and validation
//! - [`utils`] - progress bar styling

pub mod cli;
pub mod config;
pub mod core;
pub mod process;
pub mod prompt;
pub mod upgrade;
pub mod users;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

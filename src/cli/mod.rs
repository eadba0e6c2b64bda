//! Command-line interface for panelup.
//!
//! The CLI is built on `clap` derive. Global options (`--verbose`, `--quiet`,
//! `--config`, `--no-progress`) are accepted before or after the subcommand.
//!
//! # Commands
//!
//! - `upgrade` - upgrade the panel installation in place
//!
//! # Examples
//!
//! ```bash
//! panelup upgrade
//! panelup --verbose upgrade --release 1.11.3 --user nginx
//! panelup --no-progress upgrade -n --skip-download --path /var/www/pterodactyl
//! ```

mod upgrade;


pub use upgrade::UpgradeCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime configuration derived from the global flags.
///
/// Passed to commands explicitly instead of being written to the process
/// environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,

    /// Hide the progress bar
    pub no_progress: bool,

    /// Settings file chosen with `--config` or `PANELUP_CONFIG`
    pub config_path: Option<PathBuf>,
}

/// Upgrade a Pterodactyl panel installation in place.
#[derive(Parser, Debug)]
#[command(
    name = "panelup",
    about = "Upgrade a Pterodactyl panel installation in place",
    version,
    long_about = "panelup downloads a panel release, puts the panel into maintenance mode, \
                  installs dependencies, migrates the database and brings it back online."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug output, including every process spawn and exit status
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the settings file [default: ~/.panelup/config.toml]
    #[arg(short, long, global = true, env = "PANELUP_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable the progress bar
    ///
    /// Setting `PANELUP_NO_PROGRESS` has the same effect.
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upgrade the panel installation in place
    ///
    /// Downloads and unpacks a release, then runs the fixed upgrade sequence:
    /// maintenance on, permissions, dependencies, cache clears, migrations,
    /// ownership, worker restart and maintenance off. The first failing step
    /// stops the run.
    Upgrade(UpgradeCommand),
}

impl Cli {
    /// Runs the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        init_logging(&config.log_level);
        self.execute_with_config(config).await
    }

    /// Translates the global flags into a [`CliConfig`].
    ///
    /// `--verbose` selects `debug`, `--quiet` selects `error`, otherwise
    /// `warn` keeps log lines out of the progress output.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            no_progress: self.no_progress,
            config_path: self.config.clone(),
        }
    }

    /// Runs the selected command with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Upgrade(cmd) => cmd.execute(&config).await,
        }
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Calling this more than once is
/// harmless.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

//! Upgrading an installed panel in place.
//!
//! An upgrade is a fixed, ordered sequence of steps: fetch and unpack the
//! release, take the panel offline, fix permissions, install dependencies,
//! clear caches, migrate, hand files back to the web server user, restart the
//! workers and bring the panel back online. Each step delegates its effect to
//! an external program.
//!
//! # Module Structure
//!
//! - [`step`] - the unit of work and what it does
//! - [`plan`] - run configuration and the ordered step list
//! - [`context`] - the bootstrapped framework console
//! - [`runner`] - sequential execution, failure handling and outcome
//! - [`report`] - progress and output reporting
//!
//! # Example
//!
//! ```rust,no_run
//! use panelup::process::ProcessExecutor;
//! use panelup::upgrade::{ConsoleContext, ProgressReporter, RunConfiguration, UpgradeRunner, build_plan};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let root = std::path::Path::new("/var/www/pterodactyl");
//! let context = ConsoleContext::bootstrap(root, "php")?;
//! let config = RunConfiguration::new("https://example.test/panel.tar.gz", "nginx")?
//!     .environment(context.environment().clone());
//!
//! let mut runner =
//!     UpgradeRunner::new(ProcessExecutor::new(root), ProgressReporter::new(true), context);
//! let outcome = runner.run(build_plan(&config)).await;
//! assert!(outcome.is_completed());
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod plan;
pub mod report;
pub mod runner;
pub mod step;


pub use context::{AppEnvironment, ConsoleContext};
pub use plan::{DEFAULT_RELEASE_URL, RunConfiguration, UpgradePlan, build_plan, resolve_archive_url};
pub use report::{ProgressReporter, Reporter};
pub use runner::{RunOutcome, RunState, StepFailure, UpgradeRunner};
pub use step::{StepAction, StepKind, UpgradeStep};

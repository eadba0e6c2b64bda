//! Utility modules shared by the CLI and the runner.

pub mod progress;

pub use progress::ProgressBar;

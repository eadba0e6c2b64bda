//! Integration test suite for panelup
//!
//! These tests drive the compiled binary with `assert_cmd`. External
//! collaborators (the PHP console, the dependency installer) are replaced by
//! small shell scripts configured through a settings file, so no real panel
//! installation is needed.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: argument parsing, help output and validation errors
//! - **upgrade_run**: end-to-end runs against a scripted installation

mod common;

mod cli;
#[cfg(unix)]
mod upgrade_run;

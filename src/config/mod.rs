//! Configuration management for panelup
//!
//! panelup reads one optional TOML file of user-wide settings. Command-line
//! flags always take precedence over it.
//!
//! # Modules
//!
//! - `global` - the settings file, its defaults and validation
//!
//! # Resolution Order
//!
//! 1. `--config <PATH>` on the command line
//! 2. `PANELUP_CONFIG` environment variable
//! 3. `~/.panelup/config.toml`
//!
//! A file that does not exist is not an error; every key has a default.

mod global;

pub use global::GlobalConfig;

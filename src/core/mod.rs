//! Core types shared across panelup.
//!
//! Currently this is the error taxonomy and its operator-facing rendering;
//! see [`error`].

pub mod error;

pub use error::{ErrorContext, UpgradeError, user_friendly_error};

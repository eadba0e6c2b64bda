//! Progress indicators
//!
//! A thin wrapper over [`indicatif`] with panelup's styling. Progress bars draw
//! to stderr and are hidden automatically when stderr is not a terminal.
//!
//! # Environment Variables
//!
//! - `PANELUP_NO_PROGRESS`: set to any value to hide all progress bars
//!
//! # Examples
//!
//! ```rust
//! use panelup::utils::progress::ProgressBar;
//!
//! let progress = ProgressBar::new(10);
//! progress.set_prefix("Upgrading");
//!
//! for _ in 0..10 {
//!     progress.suspend(|| println!("$upgrader> php artisan view:clear"));
//!     progress.inc(1);
//! }
//!
//! progress.finish_and_clear();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};

/// Environment variable that hides progress bars when set.
pub const NO_PROGRESS_ENV: &str = "PANELUP_NO_PROGRESS";

/// Checks if progress bars should be disabled.
fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some()
}

/// A progress bar with consistent styling.
///
/// Cloning yields a handle to the same bar.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a bar tracking `len` units of work.
    ///
    /// Returns a hidden bar when `PANELUP_NO_PROGRESS` is set.
    #[must_use]
    pub fn new(len: u64) -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(len);
            bar.set_style(default_style());
            bar
        };
        Self {
            inner: bar,
        }
    }

    /// Creates a bar that never draws but still counts.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Hides the bar while `f` runs, so printed lines land above it.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.inner.suspend(f)
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    /// Stops the bar where it is and leaves it on screen.
    pub fn abandon(&self) {
        self.inner.abandon();
    }
}

fn default_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})")
        .unwrap()
        .progress_chars("━╸━")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_new() {
        let pb = ProgressBar::new(10);
        pb.set_prefix("Test");
        pb.inc(3);
        pb.finish_and_clear();
    }

    #[test]
    fn test_hidden_bar_still_counts() {
        let pb = ProgressBar::hidden();
        pb.inc(1);
        pb.inc(1);
        assert_eq!(pb.position(), 2);
    }

    #[test]
    fn test_suspend_returns_value() {
        let pb = ProgressBar::hidden();
        assert_eq!(pb.suspend(|| 42), 42);
    }

    #[test]
    fn test_abandon() {
        let pb = ProgressBar::new(5);
        pb.inc(2);
        pb.abandon();
    }
}

//! The bootstrapped framework console.
//!
//! Framework sub-commands (`down`, `view:clear`, `migrate`, ...) run through
//! the application's own console entry point. Which environment that console
//! runs in depends on the installation's `.env`, and after the dependency
//! install step the code under the console has been replaced wholesale. The
//! runner therefore holds an explicit [`ConsoleContext`] that is bootstrapped
//! once before the run and again after the dependency install, and hands it
//! to every console step.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::process::CommandSpec;

/// Name of the console entry script inside the installation directory.
pub const CONSOLE_SCRIPT: &str = "artisan";

/// The application environment as declared in `.env`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEnvironment {
    /// `APP_ENV`, e.g. `production` or `local`
    pub name: String,
    /// `APP_DEBUG`
    pub debug: bool,
}

impl Default for AppEnvironment {
    fn default() -> Self {
        Self {
            name: "production".to_string(),
            debug: false,
        }
    }
}

impl AppEnvironment {
    #[must_use]
    pub fn new(name: impl Into<String>, debug: bool) -> Self {
        Self {
            name: name.into(),
            debug,
        }
    }

    /// Production with debug off: dependency installs are optimized and
    /// development packages are excluded.
    #[must_use]
    pub fn is_optimized(&self) -> bool {
        self.name == "production" && !self.debug
    }

    /// Reads `APP_ENV` and `APP_DEBUG` from a dotenv file, with the process
    /// environment taking precedence over the file.
    ///
    /// The process environment is not modified. A missing file yields
    /// [`AppEnvironment::default`] apart from any process overrides.
    pub fn from_dotenv(path: &Path) -> Result<Self> {
        Self::from_dotenv_with(path, |key| std::env::var(key).ok())
    }

    /// Like [`AppEnvironment::from_dotenv`], with process variables looked up
    /// through `process_var`.
    pub fn from_dotenv_with(
        path: &Path,
        process_var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut env = Self::default();
        if path.exists() {
            let entries = dotenvy::from_path_iter(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            for entry in entries {
                let (key, value) =
                    entry.with_context(|| format!("Failed to parse {}", path.display()))?;
                env.apply(&key, &value);
            }
        } else {
            tracing::debug!("No dotenv file at {}, assuming production", path.display());
        }

        for key in [APP_ENV, APP_DEBUG] {
            if let Some(value) = process_var(key) {
                tracing::debug!("{} overridden by the process environment", key);
                env.apply(key, &value);
            }
        }

        Ok(env)
    }

    fn apply(&mut self, key: &str, value: &str) {
        match key {
            APP_ENV => self.name = value.to_string(),
            APP_DEBUG => self.debug = is_truthy(value),
            _ => {}
        }
    }
}

const APP_ENV: &str = "APP_ENV";
const APP_DEBUG: &str = "APP_DEBUG";

/// Truthiness of an environment value as the framework's config sees it.
///
/// `false`, `null` and `empty` (bare or parenthesised) become false, null and
/// the empty string before a boolean cast, which only treats `""` and `"0"` as
/// false. Anything else is true.
fn is_truthy(value: &str) -> bool {
    !matches!(
        value.to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "(false)" | "null" | "(null)" | "empty" | "(empty)"
    )
}

/// Handle used to run framework console sub-commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleContext {
    php: String,
    root: PathBuf,
    environment: AppEnvironment,
    generation: u32,
}

impl ConsoleContext {
    /// Bootstraps a console for the installation at `root`, reading its
    /// `.env`.
    pub fn bootstrap(root: impl AsRef<Path>, php: impl Into<String>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let environment = AppEnvironment::from_dotenv(&root.join(".env"))?;
        tracing::debug!(
            "Console bootstrapped for {} (env={}, debug={})",
            root.display(),
            environment.name,
            environment.debug
        );
        Ok(Self {
            php: php.into(),
            root,
            environment,
            generation: 0,
        })
    }

    /// Builds a context without touching the filesystem.
    #[must_use]
    pub fn with_environment(
        root: impl AsRef<Path>,
        php: impl Into<String>,
        environment: AppEnvironment,
    ) -> Self {
        Self {
            php: php.into(),
            root: root.as_ref().to_path_buf(),
            environment,
            generation: 0,
        }
    }

    /// Bootstraps again against freshly installed code.
    pub fn rebootstrap(&self) -> Result<Self> {
        let mut next = Self::bootstrap(&self.root, self.php.clone())?;
        next.generation = self.generation + 1;
        Ok(next)
    }

    /// Renders a console sub-command as a process invocation.
    #[must_use]
    pub fn command(&self, name: &str, args: &[String]) -> CommandSpec {
        let mut argv = Vec::with_capacity(args.len() + 2);
        argv.push(CONSOLE_SCRIPT.to_string());
        argv.push(name.to_string());
        argv.extend(args.iter().cloned());
        CommandSpec::exec(self.php.clone(), argv)
    }

    #[must_use]
    pub const fn environment(&self) -> &AppEnvironment {
        &self.environment
    }

    /// How many times this context has been rebootstrapped.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

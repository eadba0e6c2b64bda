//! Global settings for panelup.
//!
//! Settings live in `~/.panelup/config.toml` unless `--config` (or
//! `PANELUP_CONFIG`) points elsewhere. Every key is optional; a missing file
//! means all defaults.
//!
//! # File Format
//!
//! ```toml
//! # Owner used when --user is not given and no terminal is attached
//! default_user = "nginx"
//!
//! # Where releases are downloaded from; `{}` becomes `latest/download`
//! # or `download/v<version>`
//! release_url = "https://github.com/pterodactyl/panel/releases/{}/panel.tar.gz"
//!
//! php = "/usr/bin/php8.3"
//! composer = "/usr/local/bin/composer"
//!
//! permission_mode = "755"
//! writable_dirs = ["storage", "bootstrap/cache"]
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use panelup::config::GlobalConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = GlobalConfig::load_with_optional(None).await?;
//! config.validate()?;
//! println!("Files will be owned by {}", config.default_user);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::core::UpgradeError;
use crate::upgrade::DEFAULT_RELEASE_URL;
use crate::users::DEFAULT_USER;

/// Placeholder replaced by the release segment in `release_url`.
const URL_PLACEHOLDER: &str = "{}";

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

fn default_release_url() -> String {
    DEFAULT_RELEASE_URL.to_string()
}

fn default_php() -> String {
    "php".to_string()
}

fn default_composer() -> String {
    "composer".to_string()
}

fn default_permission_mode() -> String {
    "755".to_string()
}

fn default_writable_dirs() -> Vec<String> {
    vec!["storage".to_string(), "bootstrap/cache".to_string()]
}

/// User-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GlobalConfig {
    /// Owner applied when no user was given and nobody can be asked
    #[serde(default = "default_user")]
    pub default_user: String,

    /// Archive URL template with exactly one `{}`
    #[serde(default = "default_release_url")]
    pub release_url: String,

    /// PHP interpreter used to run the console
    #[serde(default = "default_php")]
    pub php: String,

    /// Dependency installer executable
    #[serde(default = "default_composer")]
    pub composer: String,

    /// Octal mode applied to `writable_dirs`
    #[serde(default = "default_permission_mode")]
    pub permission_mode: String,

    /// Directories, relative to the installation, that must stay writable
    #[serde(default = "default_writable_dirs")]
    pub writable_dirs: Vec<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            default_user: default_user(),
            release_url: default_release_url(),
            php: default_php(),
            composer: default_composer(),
            permission_mode: default_permission_mode(),
            writable_dirs: default_writable_dirs(),
        }
    }
}

impl GlobalConfig {
    /// Loads settings from `path` if given, otherwise from the default
    /// location. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Loads settings from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this schema.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(UpgradeError::from).with_context(
            || format!("Failed to parse settings from {}", path.display()),
        )?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(config)
    }

    /// `~/.panelup/config.toml`
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?;
        Ok(home.join(".panelup").join("config.toml"))
    }

    /// Checks values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), UpgradeError> {
        let placeholders = self.release_url.matches(URL_PLACEHOLDER).count();
        if placeholders != 1 {
            return Err(UpgradeError::ConfigError {
                message: format!(
                    "release_url must contain exactly one '{URL_PLACEHOLDER}', found {placeholders}"
                ),
            });
        }

        let mode = &self.permission_mode;
        if mode.is_empty() || mode.len() > 4 || !mode.chars().all(|c| ('0'..='7').contains(&c)) {
            return Err(UpgradeError::ConfigError {
                message: format!("permission_mode must be an octal mode such as 755, got '{mode}'"),
            });
        }

        if self.php.trim().is_empty() || self.composer.trim().is_empty() {
            return Err(UpgradeError::ConfigError {
                message: "php and composer must not be empty".to_string(),
            });
        }

        crate::users::validate_user(&self.default_user).map_err(|_| UpgradeError::ConfigError {
            message: format!("default_user '{}' is not a valid user name", self.default_user),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_global_config_default() {
        let config = GlobalConfig::default();
        assert_eq!(config.default_user, "www-data");
        assert_eq!(config.release_url, DEFAULT_RELEASE_URL);
        assert_eq!(config.permission_mode, "755");
        assert_eq!(config.writable_dirs, vec!["storage", "bootstrap/cache"]);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config =
            GlobalConfig::load_with_optional(Some(temp.path().join("absent.toml"))).await.unwrap();
        assert_eq!(config, GlobalConfig::default());
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "default_user = \"nginx\"\nphp = \"/usr/bin/php8.3\"\n").unwrap();

        let config = GlobalConfig::load_from(&path).await.unwrap();
        assert_eq!(config.default_user, "nginx");
        assert_eq!(config.php, "/usr/bin/php8.3");
        assert_eq!(config.composer, "composer");
        assert_eq!(config.writable_dirs.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_toml_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "default_user = [").unwrap();

        let err = GlobalConfig::load_from(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings"));
        assert!(err.downcast_ref::<UpgradeError>().is_some());
    }

    #[test]
    fn test_release_url_needs_one_placeholder() {
        let mut config = GlobalConfig::default();
        config.release_url = "https://mirror.example/panel.tar.gz".to_string();
        assert!(matches!(config.validate(), Err(UpgradeError::ConfigError { .. })));

        config.release_url = "https://mirror.example/{}/{}.tar.gz".to_string();
        assert!(config.validate().is_err());

        config.release_url = "https://mirror.example/{}/panel.tar.gz".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_permission_mode_must_be_octal() {
        let mut config = GlobalConfig::default();
        for mode in ["775", "0755", "700"] {
            config.permission_mode = mode.to_string();
            assert!(config.validate().is_ok(), "{mode} should be accepted");
        }
        for mode in ["", "789", "rwx", "75a", "07555"] {
            config.permission_mode = mode.to_string();
            assert!(config.validate().is_err(), "{mode:?} should be rejected");
        }
    }

    #[test]
    fn test_default_user_is_validated() {
        let config = GlobalConfig {
            default_user: "www data".to_string(),
            ..GlobalConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_path_is_under_home() {
        let path = GlobalConfig::default_path().unwrap();
        assert!(path.ends_with(".panelup/config.toml"));
    }
}

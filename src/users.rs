//! Resolving the web server user that owns the installation.
//!
//! The upgrade finishes by handing every file back to this user, so its name
//! ends up in a `chown` shell line. [`validate_user`] is the single gate every
//! name passes through before that can happen.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::core::UpgradeError;
use crate::prompt::Prompter;

/// Fallback owner when nothing else is known.
pub const DEFAULT_USER: &str = "www-data";

/// Common web server users offered when the detected owner is rejected.
pub const SUGGESTED_USERS: [&str; 3] = ["www-data", "apache", "nginx"];

/// Directory whose owner is taken to be the web server user.
pub const OWNER_PROBE: &str = "public";

/// Longest user name accepted by common `useradd` implementations.
const MAX_USER_LEN: usize = 32;

fn user_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z_][a-z0-9_-]*\$?$").expect("user name pattern is valid")
    })
}

/// Checks that `user` is a plausible system user name.
pub fn validate_user(user: &str) -> Result<(), UpgradeError> {
    if user.len() <= MAX_USER_LEN && user_pattern().is_match(user) {
        Ok(())
    } else {
        Err(UpgradeError::InvalidUser {
            user: user.to_string(),
        })
    }
}

/// Looks up the name of the user owning `path`.
///
/// Returns `None` when the path is missing or the owner has no passwd entry.
#[cfg(unix)]
#[must_use]
pub fn detect_owner(path: &Path) -> Option<String> {
    use nix::unistd::{Uid, User};
    use std::os::unix::fs::MetadataExt;

    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!("Cannot stat {}: {}", path.display(), e);
            return None;
        }
    };

    match User::from_uid(Uid::from_raw(metadata.uid())) {
        Ok(Some(user)) => Some(user.name),
        Ok(None) => {
            tracing::debug!("No passwd entry for uid {}", metadata.uid());
            None
        }
        Err(e) => {
            tracing::debug!("Failed to look up uid {}: {}", metadata.uid(), e);
            None
        }
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn detect_owner(_path: &Path) -> Option<String> {
    None
}

/// Decides which user should own the installation after the upgrade.
///
/// - An `explicit` name (from `--user`) is used as given.
/// - Without a prompter, `fallback` is used.
/// - With a prompter, the owner of `<install_dir>/public` is proposed and the
///   operator either confirms it or types another name.
///
/// Whatever is chosen is validated before it is returned.
pub fn resolve_user(
    explicit: Option<&str>,
    prompter: Option<&mut dyn Prompter>,
    install_dir: &Path,
    fallback: &str,
) -> Result<String, UpgradeError> {
    let user = match (explicit, prompter) {
        (Some(user), _) => user.to_string(),
        (None, None) => fallback.to_string(),
        (None, Some(prompter)) => {
            let detected = detect_owner(&install_dir.join(OWNER_PROBE)).unwrap_or_else(|| {
                tracing::warn!(
                    "Could not detect the owner of {}, assuming {}",
                    OWNER_PROBE,
                    fallback
                );
                fallback.to_string()
            });

            let question =
                format!("Your webserver user has been detected as [{detected}]: is this correct?");
            if prompter.confirm(&question, true)? {
                detected
            } else {
                prompter.choose(
                    "Please enter the name of the user running your webserver process. This varies \
                     from system to system, but is generally \"www-data\", \"nginx\", or \"apache\".",
                    &SUGGESTED_USERS,
                )?
            }
        }
    };

    let user = user.trim().to_string();
    validate_user(&user)?;
    Ok(user)
}

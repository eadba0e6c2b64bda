//! Building the ordered list of upgrade steps.
//!
//! [`build_plan`] turns a resolved [`RunConfiguration`] into an
//! [`UpgradePlan`]. The step order is fixed; configuration only decides
//! whether the download step is present and how individual steps are
//! parameterised.

use crate::core::UpgradeError;
use crate::process::{CommandSpec, shell_quote};
use crate::users::validate_user;

use super::context::AppEnvironment;
use super::step::{StepKind, UpgradeStep};

/// Release archive location, `{}` is replaced by the release segment.
pub const DEFAULT_RELEASE_URL: &str = "https://github.com/pterodactyl/panel/releases/{}/panel.tar.gz";

/// Resolves the archive to download.
///
/// An explicit `url` always wins. Otherwise `release` pins a version
/// (`download/v<version>`, a leading `v` is accepted) and its absence selects
/// the latest release (`latest/download`).
pub fn resolve_archive_url(
    template: &str,
    url: Option<&str>,
    release: Option<&str>,
) -> Result<String, UpgradeError> {
    if let Some(url) = url.filter(|url| !url.is_empty()) {
        return Ok(url.to_string());
    }

    let segment = match release.map(str::trim).filter(|release| !release.is_empty()) {
        Some(release) => {
            let version = release.trim_start_matches('v');
            semver::Version::parse(version).map_err(|_| UpgradeError::InvalidRelease {
                release: release.to_string(),
            })?;
            format!("download/v{version}")
        }
        None => "latest/download".to_string(),
    };

    Ok(template.replacen("{}", &segment, 1))
}

/// Resolved inputs for one upgrade run.
///
/// Construction validates the ownership user, so a `RunConfiguration` never
/// carries a name that is unsafe to splice into a shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    archive_url: String,
    user: String,
    skip_download: bool,
    environment: AppEnvironment,
    permission_mode: String,
    writable_dirs: Vec<String>,
    composer: String,
}

impl RunConfiguration {
    /// Creates a configuration with default step parameters.
    pub fn new(archive_url: impl Into<String>, user: impl Into<String>) -> Result<Self, UpgradeError> {
        let user = user.into();
        validate_user(&user)?;
        Ok(Self {
            archive_url: archive_url.into(),
            user,
            skip_download: false,
            environment: AppEnvironment::default(),
            permission_mode: "755".to_string(),
            writable_dirs: vec!["storage".to_string(), "bootstrap/cache".to_string()],
            composer: "composer".to_string(),
        })
    }

    #[must_use]
    pub const fn skip_download(mut self, skip: bool) -> Self {
        self.skip_download = skip;
        self
    }

    #[must_use]
    pub fn environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn permission_mode(mut self, mode: impl Into<String>) -> Self {
        self.permission_mode = mode.into();
        self
    }

    #[must_use]
    pub fn writable_dirs(mut self, dirs: Vec<String>) -> Self {
        self.writable_dirs = dirs;
        self
    }

    #[must_use]
    pub fn composer(mut self, composer: impl Into<String>) -> Self {
        self.composer = composer.into();
        self
    }
}

/// The resolved, ordered list of steps for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradePlan {
    steps: Vec<UpgradeStep>,
}

impl UpgradePlan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn steps(&self) -> &[UpgradeStep] {
        &self.steps
    }

    /// Step kinds in execution order.
    #[must_use]
    pub fn kinds(&self) -> Vec<StepKind> {
        self.steps.iter().map(UpgradeStep::kind).collect()
    }

    #[must_use]
    pub fn step(&self, kind: StepKind) -> Option<&UpgradeStep> {
        self.steps.iter().find(|step| step.kind() == kind)
    }
}

impl IntoIterator for UpgradePlan {
    type Item = UpgradeStep;
    type IntoIter = std::vec::IntoIter<UpgradeStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

/// Builds the plan for `config`: 10 steps, or 9 when the download is skipped.
#[must_use]
pub fn build_plan(config: &RunConfiguration) -> UpgradePlan {
    let mut steps = Vec::with_capacity(StepKind::ALL.len());

    if !config.skip_download {
        steps.push(
            UpgradeStep::command(
                StepKind::Download,
                CommandSpec::shell(format!(
                    "curl -fL {} | tar -xzv",
                    shell_quote(&config.archive_url)
                )),
            )
            .skippable(),
        );
    }

    steps.push(UpgradeStep::console(StepKind::MaintenanceOn, "down", Vec::<String>::new()));

    let mut chmod = vec!["-R".to_string(), config.permission_mode.clone()];
    chmod.extend(config.writable_dirs.iter().cloned());
    steps.push(UpgradeStep::command(StepKind::FixPermissions, CommandSpec::exec("chmod", chmod)));

    let mut install = vec!["install".to_string(), "--no-ansi".to_string()];
    if config.environment.is_optimized() {
        install.push("--optimize-autoloader".to_string());
        install.push("--no-dev".to_string());
    }
    steps.push(
        UpgradeStep::command(
            StepKind::InstallDependencies,
            CommandSpec::exec(config.composer.clone(), install),
        )
        .rebootstrap(),
    );

    steps.push(UpgradeStep::console(StepKind::ClearViewCache, "view:clear", Vec::<String>::new()));
    steps.push(UpgradeStep::console(
        StepKind::ClearConfigCache,
        "config:clear",
        Vec::<String>::new(),
    ));
    steps.push(UpgradeStep::console(StepKind::Migrate, "migrate", ["--seed", "--force"]));
    steps.push(UpgradeStep::command(
        StepKind::RestoreOwnership,
        CommandSpec::shell(format!("chown -R {user}:{user} *", user = config.user)),
    ));
    steps.push(UpgradeStep::console(StepKind::RestartWorkers, "queue:restart", Vec::<String>::new()));
    steps.push(UpgradeStep::console(StepKind::MaintenanceOff, "up", Vec::<String>::new()));

    UpgradePlan {
        steps,
    }
}

//! Upgrade a panel installation in place.
//!
//! # Examples
//!
//! ```bash
//! # Upgrade to the latest release, asking before anything happens
//! panelup upgrade
//!
//! # Pin a release and the web server user, no questions
//! panelup upgrade --release 1.11.3 --user nginx -n
//!
//! # Files already unpacked; only run the remaining steps
//! panelup upgrade --skip-download --path /var/www/pterodactyl
//! ```
//!
//! # Flow
//!
//! 1. Resolve the archive URL (`--url`, `--release` or the latest release)
//! 2. When downloading, print the integrity warning and the source
//! 3. Interactive only: confirm the download, resolve the user, confirm the run
//! 4. Bootstrap the console, build the plan and run it

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use super::CliConfig;
use crate::config::GlobalConfig;
use crate::core::UpgradeError;
use crate::process::{Executor, ProcessExecutor};
use crate::prompt::{Prompter, TerminalPrompter};
use crate::upgrade::{
    ConsoleContext, ProgressReporter, Reporter, RunConfiguration, RunOutcome, UpgradeRunner,
    build_plan, resolve_archive_url,
};
use crate::users::resolve_user;

const INTEGRITY_WARNING: &str = "This command does not verify the integrity of downloaded assets. \
     Please ensure that you trust the download source before continuing. If you do not wish to \
     download an archive, please indicate that using the --skip-download flag, or answering \"no\" \
     to the question below.";

const DOWNLOAD_QUESTION: &str =
    "Would you like to download and unpack the archive files for the latest version?";

const RUN_QUESTION: &str = "Are you sure you want to run the upgrade process for your Panel?";

/// Arguments for `panelup upgrade`.
#[derive(Args, Debug, Clone, Default)]
pub struct UpgradeCommand {
    /// User that should own the panel files after the upgrade
    ///
    /// When omitted, an interactive run detects the owner of `public/` and
    /// asks; a non-interactive run uses `default_user` from the settings.
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,

    /// Download the archive from this URL instead of a GitHub release
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Release version to download, e.g. `1.11.3`
    #[arg(long, value_name = "VERSION")]
    pub release: Option<String>,

    /// Do not download and unpack an archive
    #[arg(long)]
    pub skip_download: bool,

    /// Panel installation directory [default: current directory]
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Never prompt; use flags and settings as given
    #[arg(short = 'n', long)]
    pub no_interaction: bool,
}

impl UpgradeCommand {
    /// Runs the upgrade against the real terminal and processes.
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let settings = GlobalConfig::load_with_optional(config.config_path.clone()).await?;
        settings.validate()?;

        let install_dir = match &self.path {
            Some(path) => path.clone(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        if !install_dir.is_dir() {
            bail!("Installation directory {} does not exist", install_dir.display());
        }

        let interactive = !self.no_interaction && std::io::stdin().is_terminal();
        tracing::debug!("Upgrading {} (interactive={})", install_dir.display(), interactive);

        let mut terminal = TerminalPrompter::new();
        let prompter: Option<&mut dyn Prompter> =
            if interactive { Some(&mut terminal) } else { None };

        let outcome = self
            .run_with(
                &settings,
                &install_dir,
                prompter,
                ProcessExecutor::new(&install_dir),
                ProgressReporter::new(!config.no_progress),
            )
            .await?;

        match outcome {
            None => {
                println!("{}", "Upgrade cancelled".yellow());
                Ok(())
            }
            Some(RunOutcome::Completed {
                ..
            }) => {
                println!("{}", "Finished running upgrade.".green());
                Ok(())
            }
            Some(RunOutcome::Failed(failure)) => Err(UpgradeError::from(failure).into()),
        }
    }

    /// Drives the whole flow with injected collaborators.
    ///
    /// `prompter` is `None` for non-interactive runs. Returns `None` when the
    /// operator declined the final confirmation; no step has run in that case.
    pub async fn run_with<E: Executor, R: Reporter>(
        &self,
        settings: &GlobalConfig,
        install_dir: &Path,
        mut prompter: Option<&mut dyn Prompter>,
        executor: E,
        reporter: R,
    ) -> Result<Option<RunOutcome>> {
        let archive_url = resolve_archive_url(
            &settings.release_url,
            self.url.as_deref(),
            self.release.as_deref(),
        )?;

        let mut skip_download = self.skip_download;
        if !skip_download {
            println!("{}: {}", "warning".yellow().bold(), INTEGRITY_WARNING);
            println!("{}", "Download Source (set with --url=):".yellow());
            println!("{archive_url}");

            if let Some(prompter) = reborrow(&mut prompter) {
                skip_download = !prompter.confirm(DOWNLOAD_QUESTION, true)?;
            }
        }

        let user = resolve_user(
            self.user.as_deref(),
            reborrow(&mut prompter),
            install_dir,
            &settings.default_user,
        )?;

        if let Some(prompter) = reborrow(&mut prompter)
            && !prompter.confirm(RUN_QUESTION, false)?
        {
            tracing::info!("Upgrade declined at final confirmation");
            return Ok(None);
        }

        let context = ConsoleContext::bootstrap(install_dir, settings.php.clone())?;
        let config = RunConfiguration::new(archive_url, user)?
            .skip_download(skip_download)
            .environment(context.environment().clone())
            .permission_mode(settings.permission_mode.clone())
            .writable_dirs(settings.writable_dirs.clone())
            .composer(settings.composer.clone());

        let mut runner = UpgradeRunner::new(executor, reporter, context);
        Ok(Some(runner.run(build_plan(&config)).await))
    }
}

fn reborrow<'a>(prompter: &'a mut Option<&mut dyn Prompter>) -> Option<&'a mut dyn Prompter> {
    match prompter {
        Some(prompter) => Some(&mut **prompter),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordingExecutor, RecordingReporter, ScriptedPrompter, init_test_logging};
    use tempfile::TempDir;

    fn command() -> UpgradeCommand {
        UpgradeCommand {
            url: Some("https://example.test/panel.tar.gz".to_string()),
            ..UpgradeCommand::default()
        }
    }

    #[tokio::test]
    async fn test_declining_final_confirmation_runs_nothing() {
        init_test_logging(None);
        let temp_dir = TempDir::new().unwrap();
        let executor = RecordingExecutor::new();
        let reporter = RecordingReporter::new();
        let mut prompter = ScriptedPrompter::new().confirm_with(true).confirm_with(true).confirm_with(false);

        let outcome = command()
            .run_with(
                &GlobalConfig::default(),
                temp_dir.path(),
                Some(&mut prompter),
                executor.clone(),
                reporter.clone(),
            )
            .await
            .unwrap();

        assert_eq!(outcome, None);
        assert!(executor.calls().is_empty());
        assert_eq!(reporter.log().total, None);
        assert_eq!(prompter.questions().len(), 3);
        assert_eq!(prompter.questions()[2], RUN_QUESTION);
    }

    #[tokio::test]
    async fn test_declining_download_skips_download_step() {
        let temp_dir = TempDir::new().unwrap();
        let executor = RecordingExecutor::new();
        let mut prompter = ScriptedPrompter::new().confirm_with(false).confirm_with(true);
        let cmd = UpgradeCommand {
            user: Some("nginx".to_string()),
            ..command()
        };

        let outcome = cmd
            .run_with(
                &GlobalConfig::default(),
                temp_dir.path(),
                Some(&mut prompter),
                executor.clone(),
                RecordingReporter::new(),
            )
            .await
            .unwrap()
            .unwrap();

        assert!(outcome.is_completed());
        assert_eq!(executor.calls().len(), 9);
        assert_eq!(executor.calls()[0], "php artisan down");
        assert_eq!(executor.calls()[6], "chown -R nginx:nginx *");
    }

    #[tokio::test]
    async fn test_non_interactive_uses_configured_user() {
        let temp_dir = TempDir::new().unwrap();
        let executor = RecordingExecutor::new();
        let settings = GlobalConfig {
            default_user: "apache".to_string(),
            ..GlobalConfig::default()
        };
        let cmd = UpgradeCommand {
            skip_download: true,
            no_interaction: true,
            ..command()
        };

        let outcome =
            cmd.run_with(&settings, temp_dir.path(), None, executor.clone(), RecordingReporter::new())
                .await
                .unwrap()
                .unwrap();

        assert_eq!(outcome, RunOutcome::Completed { steps: 9 });
        assert!(executor.calls().contains(&"chown -R apache:apache *".to_string()));
    }

    #[tokio::test]
    async fn test_release_selects_download_url() {
        let temp_dir = TempDir::new().unwrap();
        let executor = RecordingExecutor::new();
        let cmd = UpgradeCommand {
            release: Some("v1.11.3".to_string()),
            ..UpgradeCommand::default()
        };

        cmd.run_with(
            &GlobalConfig::default(),
            temp_dir.path(),
            None,
            executor.clone(),
            RecordingReporter::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            executor.calls()[0],
            "curl -fL 'https://github.com/pterodactyl/panel/releases/download/v1.11.3/panel.tar.gz' | tar -xzv"
        );
    }

    #[tokio::test]
    async fn test_settings_flow_into_plan() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(".env"), "APP_ENV=local\nAPP_DEBUG=true\n").unwrap();
        let executor = RecordingExecutor::new();
        let settings = GlobalConfig {
            php: "php8.3".to_string(),
            composer: "/usr/local/bin/composer".to_string(),
            permission_mode: "775".to_string(),
            ..GlobalConfig::default()
        };
        let cmd = UpgradeCommand {
            skip_download: true,
            ..command()
        };

        cmd.run_with(&settings, temp_dir.path(), None, executor.clone(), RecordingReporter::new())
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls[0], "php8.3 artisan down");
        assert_eq!(calls[1], "chmod -R 775 storage bootstrap/cache");
        assert_eq!(calls[2], "/usr/local/bin/composer install --no-ansi");
    }

    #[tokio::test]
    async fn test_invalid_user_fails_before_any_step() {
        let temp_dir = TempDir::new().unwrap();
        let executor = RecordingExecutor::new();
        let cmd = UpgradeCommand {
            user: Some("root;reboot".to_string()),
            ..command()
        };

        let err = cmd
            .run_with(
                &GlobalConfig::default(),
                temp_dir.path(),
                None,
                executor.clone(),
                RecordingReporter::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<UpgradeError>(), Some(UpgradeError::InvalidUser { .. })));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_run_is_reported_as_outcome() {
        init_test_logging(None);
        let temp_dir = TempDir::new().unwrap();
        let executor = RecordingExecutor::new().fail_on("migrate", 1);
        let cmd = UpgradeCommand {
            skip_download: true,
            ..command()
        };

        let outcome = cmd
            .run_with(
                &GlobalConfig::default(),
                temp_dir.path(),
                None,
                executor.clone(),
                RecordingReporter::new(),
            )
            .await
            .unwrap()
            .unwrap();

        let failure = outcome.failure().unwrap();
        let error = UpgradeError::from(failure.clone());
        assert!(matches!(error, UpgradeError::StepFailed { in_maintenance: true, .. }));
    }
}

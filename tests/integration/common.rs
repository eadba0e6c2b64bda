//! Shared fixtures for the integration suite.

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway panel installation with its own settings file.
pub struct TestPanel {
    pub temp: TempDir,
}

impl TestPanel {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("panel");
        fs::create_dir_all(root.join("storage")).unwrap();
        fs::create_dir_all(root.join("bootstrap/cache")).unwrap();
        fs::create_dir_all(root.join("public")).unwrap();
        fs::write(root.join(".env"), "APP_ENV=production\nAPP_DEBUG=false\n").unwrap();
        Self {
            temp,
        }
    }

    pub fn root(&self) -> PathBuf {
        self.temp.path().join("panel")
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp.path().join("config.toml")
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.config_path(), content).unwrap();
    }

    /// Writes an executable shell script under `bin/` and returns its path.
    #[cfg(unix)]
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let bin = self.temp.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let path = bin.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// `panelup` pointed at this panel's settings file, without colors or a
    /// progress bar.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("panelup").unwrap();
        cmd.env("PANELUP_CONFIG", self.config_path())
            .env("PANELUP_NO_PROGRESS", "1")
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .current_dir(self.temp.path());
        cmd
    }
}

/// Path as a string for command-line arguments.
pub fn arg(path: &Path) -> String {
    path.display().to_string()
}

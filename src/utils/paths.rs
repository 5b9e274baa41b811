use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::RuntimeKind;

const APP_DIR_NAME: &str = "PTD Launcher";

/// Filesystem layout of the launcher's data directory.
///
/// Everything the launcher persists lives under a single root:
/// `Games/` for SWF payloads and `version.json`, `Flash/` and `Ruffle/` for
/// the runtime executables, `logs/` for the rolling log, and `settings.json`
/// at the root itself.
#[derive(Clone, Debug)]
pub struct LauncherPaths {
    root: PathBuf,
}

impl LauncherPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the data root: the `PTD_LAUNCHER_ROOT` environment override
    /// when set (portable installs, tests), else the per-OS data directory.
    pub fn discover() -> Self {
        if let Ok(value) = std::env::var("PTD_LAUNCHER_ROOT") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Self::new(trimmed);
            }
        }

        match dirs::data_dir() {
            Some(base) => Self::new(base.join(APP_DIR_NAME)),
            None => Self::new(APP_DIR_NAME),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn games_dir(&self) -> PathBuf {
        self.root.join("Games")
    }

    pub fn flash_dir(&self) -> PathBuf {
        self.root.join("Flash")
    }

    pub fn ruffle_dir(&self) -> PathBuf {
        self.root.join("Ruffle")
    }

    pub fn runtime_dir(&self, kind: RuntimeKind) -> PathBuf {
        match kind {
            RuntimeKind::Flash => self.flash_dir(),
            RuntimeKind::Ruffle => self.ruffle_dir(),
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    pub fn versions_file(&self) -> PathBuf {
        self.games_dir().join("version.json")
    }

    /// Create the directory tree. Idempotent.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(self.games_dir())?;
        fs::create_dir_all(self.flash_dir())?;
        fs::create_dir_all(self.ruffle_dir())?;
        Ok(())
    }
}

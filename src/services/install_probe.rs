//! Installation-state detection. The filesystem is the source of truth:
//! nothing here is cached, and concurrent callers are fine.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::catalog::Catalog;
use crate::models::{GameId, ItemId, RuntimeKind, Settings};
use crate::utils::paths::LauncherPaths;

/// Files smaller than this are treated as not installed; an externally
/// truncated or empty file must not count as a usable payload.
pub const MIN_INSTALLED_SIZE: u64 = 64;

#[derive(Clone)]
pub struct InstallProbe {
    paths: LauncherPaths,
    catalog: Arc<Catalog>,
}

impl InstallProbe {
    pub fn new(paths: LauncherPaths, catalog: Arc<Catalog>) -> Self {
        Self { paths, catalog }
    }

    /// A regular file of at least [`MIN_INSTALLED_SIZE`] bytes. No content
    /// verification beyond that.
    pub fn is_installed(&self, path: &Path) -> bool {
        fs::metadata(path)
            .map(|meta| meta.is_file() && meta.len() >= MIN_INSTALLED_SIZE)
            .unwrap_or(false)
    }

    /// Effective executable path for a runtime: the configured custom path
    /// when one is set, else the default directory plus the catalog filename.
    pub fn runtime_path(&self, kind: RuntimeKind, settings: &Settings) -> PathBuf {
        let custom = match kind {
            RuntimeKind::Flash => settings.flash_player_path.as_deref(),
            RuntimeKind::Ruffle => settings.ruffle_path.as_deref(),
        };
        if let Some(custom) = custom {
            let trimmed = custom.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        let filename = match kind {
            RuntimeKind::Flash => &self.catalog.flash().filename,
            RuntimeKind::Ruffle => &self.catalog.ruffle().filename,
        };
        self.paths.runtime_dir(kind).join(filename)
    }

    pub fn runtime_installed(&self, kind: RuntimeKind, settings: &Settings) -> bool {
        self.is_installed(&self.runtime_path(kind, settings))
    }

    /// Canonical install location for a game payload. Games do not support
    /// custom paths.
    pub fn game_path(&self, game: GameId) -> PathBuf {
        self.paths.games_dir().join(format!("{}.swf", game.id()))
    }

    /// The path an installed game would launch from: the canonical
    /// `<GAMEID>.swf` if usable, else the newest `<GAMEID>-v*.swf` left by
    /// older launcher versions. `None` when nothing usable exists.
    pub fn installed_game_path(&self, game: GameId) -> Option<PathBuf> {
        let canonical = self.game_path(game);
        if self.is_installed(&canonical) {
            return Some(canonical);
        }
        self.latest_versioned_file(game)
    }

    pub fn game_installed(&self, game: GameId) -> bool {
        self.installed_game_path(game).is_some()
    }

    /// Effective path for any catalog item, custom overrides applied.
    pub fn effective_path(&self, item: ItemId, settings: &Settings) -> PathBuf {
        match item {
            ItemId::Runtime(kind) => self.runtime_path(kind, settings),
            ItemId::Game(game) => self.game_path(game),
        }
    }

    fn latest_versioned_file(&self, game: GameId) -> Option<PathBuf> {
        let prefix = format!("{}-v", game.id());
        let entries = fs::read_dir(self.paths.games_dir()).ok()?;

        let mut latest: Option<(SystemTime, PathBuf)> = None;
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(&prefix) || !name.ends_with(".swf") {
                continue;
            }
            if !self.is_installed(&path) {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            if latest.as_ref().map(|(ts, _)| modified > *ts).unwrap_or(true) {
                latest = Some((modified, path));
            }
        }
        latest.map(|(_, path)| path)
    }
}

//! Static acquisition catalog: where every runtime and game payload comes
//! from and what the installed file is called. The built-in defaults match
//! the launcher's canonical sources; a bundled `config.json` with the same
//! shape can override them.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::models::GameId;

/// One OS entry of the Flash Player catalog section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashTarget {
    pub primary_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_url: Option<String>,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashSection {
    pub fallback_version: String,
    pub windows: FlashTarget,
    pub macos: FlashTarget,
    pub linux: FlashTarget,
}

/// One OS entry of the Ruffle catalog section. The URL pins a release
/// archive; moving to a newer build is a config override, not code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuffleTarget {
    pub url: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuffleSection {
    pub windows: RuffleTarget,
    pub macos: RuffleTarget,
    pub linux: RuffleTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub flash_player: FlashSection,
    pub ruffle: RuffleSection,
    pub game_urls: HashMap<String, String>,
}

impl Default for FlashSection {
    fn default() -> Self {
        Self {
            fallback_version: "32.0.0.465".to_string(),
            windows: FlashTarget {
                primary_url: "https://www.flash.cn/cdm/latest/flashplayer_sa.exe".to_string(),
                fallback_url: Some(
                    "https://fpdownload.macromedia.com/pub/flashplayer/updaters/32/flashplayer_32_sa.exe"
                        .to_string(),
                ),
                filename: "flashplayer_sa.exe".to_string(),
            },
            macos: FlashTarget {
                primary_url:
                    "https://fpdownload.macromedia.com/pub/flashplayer/updaters/32/flashplayer_32_sa.dmg"
                        .to_string(),
                fallback_url: None,
                filename: "Flash Player.app".to_string(),
            },
            linux: FlashTarget {
                primary_url:
                    "https://fpdownload.macromedia.com/pub/flashplayer/updaters/32/flash_player_sa_linux.x86_64.tar.gz"
                        .to_string(),
                fallback_url: Some(
                    "https://archive.org/download/flashplayer_standalone_projectors/flash_player_sa_linux.x86_64.tar.gz"
                        .to_string(),
                ),
                filename: "flashplayer".to_string(),
            },
        }
    }
}

impl Default for RuffleSection {
    fn default() -> Self {
        Self {
            windows: RuffleTarget {
                url: "https://github.com/ruffle-rs/ruffle/releases/download/nightly-2026-02-09/ruffle-nightly-2026_02_09-windows-x86_64.zip"
                    .to_string(),
                filename: "ruffle.exe".to_string(),
            },
            macos: RuffleTarget {
                url: "https://github.com/ruffle-rs/ruffle/releases/download/nightly-2026-02-09/ruffle-nightly-2026_02_09-macos-universal.tar.gz"
                    .to_string(),
                filename: "ruffle".to_string(),
            },
            linux: RuffleTarget {
                url: "https://github.com/ruffle-rs/ruffle/releases/download/nightly-2026-02-09/ruffle-nightly-2026_02_09-linux-x86_64.tar.gz"
                    .to_string(),
                filename: "ruffle".to_string(),
            },
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let game_urls = GameId::ALL
            .iter()
            .map(|game| {
                let slug = game.id().to_lowercase().replace('_', "-");
                (
                    game.id().to_string(),
                    format!("https://ptd.onl/{}-latest.swf", slug),
                )
            })
            .collect();

        Self {
            flash_player: FlashSection::default(),
            ruffle: RuffleSection::default(),
            game_urls,
        }
    }
}

impl Catalog {
    /// Read a catalog override from `config.json`.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read an override if one exists at `path`, otherwise use the built-in
    /// defaults. Parse failures degrade to defaults with a warning.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "unreadable catalog override, using defaults");
                Self::default()
            }
        }
    }

    /// Flash Player sources for the running OS.
    pub fn flash(&self) -> &FlashTarget {
        #[cfg(target_os = "windows")]
        return &self.flash_player.windows;
        #[cfg(target_os = "macos")]
        return &self.flash_player.macos;
        #[cfg(target_os = "linux")]
        return &self.flash_player.linux;
    }

    pub fn flash_version(&self) -> &str {
        &self.flash_player.fallback_version
    }

    /// Ruffle source for the running OS.
    pub fn ruffle(&self) -> &RuffleTarget {
        #[cfg(target_os = "windows")]
        return &self.ruffle.windows;
        #[cfg(target_os = "macos")]
        return &self.ruffle.macos;
        #[cfg(target_os = "linux")]
        return &self.ruffle.linux;
    }

    pub fn game_url(&self, game: GameId) -> Option<&str> {
        self.game_urls.get(game.id()).map(String::as_str)
    }
}

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The two supported players for SWF game assets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuntimeKind {
    Flash,
    Ruffle,
}

impl RuntimeKind {
    /// Stable identifier used in event payloads and version records.
    pub fn id(&self) -> &'static str {
        match self {
            RuntimeKind::Flash => "flash_player",
            RuntimeKind::Ruffle => "ruffle",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RuntimeKind::Flash => "Flash Player",
            RuntimeKind::Ruffle => "Ruffle",
        }
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The six downloadable game variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameId {
    Ptd1,
    Ptd1Hacked,
    Ptd2,
    Ptd2Hacked,
    Ptd3,
    Ptd3Hacked,
}

impl GameId {
    pub const ALL: [GameId; 6] = [
        GameId::Ptd1,
        GameId::Ptd1Hacked,
        GameId::Ptd2,
        GameId::Ptd2Hacked,
        GameId::Ptd3,
        GameId::Ptd3Hacked,
    ];

    /// Stable identifier; also the stem of the installed `.swf` file.
    pub fn id(&self) -> &'static str {
        match self {
            GameId::Ptd1 => "PTD1",
            GameId::Ptd1Hacked => "PTD1_Hacked",
            GameId::Ptd2 => "PTD2",
            GameId::Ptd2Hacked => "PTD2_Hacked",
            GameId::Ptd3 => "PTD3",
            GameId::Ptd3Hacked => "PTD3_Hacked",
        }
    }

    pub fn parse(value: &str) -> Option<GameId> {
        GameId::ALL.iter().copied().find(|game| game.id() == value)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Catalog key shared by downloads, installation checks and progress events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemId {
    Runtime(RuntimeKind),
    Game(GameId),
}

impl ItemId {
    pub fn id(&self) -> &'static str {
        match self {
            ItemId::Runtime(kind) => kind.id(),
            ItemId::Game(game) => game.id(),
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for ItemId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

/// User settings persisted in `settings.json`. Absent fields mean "use the
/// default", so every field is optional and skipped when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash_player_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_ruffle: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ruffle_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
}

impl Settings {
    pub fn use_ruffle(&self) -> bool {
        self.use_ruffle.unwrap_or(false)
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled.unwrap_or(true)
    }
}

/// Status tag carried by every progress event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Starting,
    InProgress,
    Completed,
    Failed,
}

/// Payload of the `download-progress` event.
#[derive(Clone, Debug, Serialize)]
pub struct DownloadProgress {
    pub item: ItemId,
    pub progress: u32,
    pub downloaded: u64,
    pub total: u64,
    pub status: DownloadStatus,
}

/// The player selected by current settings, with its effective executable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeChoice {
    pub kind: RuntimeKind,
    pub executable: PathBuf,
}

/// Bookkeeping record stored in `Games/version.json`. Best-effort only;
/// installation state is always re-derived from the filesystem.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InstalledVersions {
    #[serde(default)]
    pub flash_player: String,
    #[serde(default)]
    pub ruffle: String,
    #[serde(default)]
    pub games: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults_apply_when_fields_absent() {
        let settings = Settings::default();
        assert!(!settings.use_ruffle());
        assert!(settings.sound_enabled());
    }

    #[test]
    fn settings_serialization_skips_absent_fields() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert_eq!(json, "{}");

        let settings = Settings {
            use_ruffle: Some(true),
            ..Settings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"use_ruffle":true}"#);
    }

    #[test]
    fn item_ids_match_wire_form() {
        assert_eq!(ItemId::Runtime(RuntimeKind::Flash).id(), "flash_player");
        assert_eq!(ItemId::Runtime(RuntimeKind::Ruffle).id(), "ruffle");
        assert_eq!(ItemId::Game(GameId::Ptd2Hacked).id(), "PTD2_Hacked");
        assert_eq!(GameId::parse("PTD3"), Some(GameId::Ptd3));
        assert_eq!(GameId::parse("PTD4"), None);
    }

    #[test]
    fn progress_event_serializes_status_tag() {
        let event = DownloadProgress {
            item: ItemId::Game(GameId::Ptd1),
            progress: 42,
            downloaded: 420,
            total: 1000,
            status: DownloadStatus::InProgress,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["item"], "PTD1");
        assert_eq!(value["status"], "in_progress");
        assert_eq!(value["progress"], 42);
    }
}

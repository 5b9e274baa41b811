//! Persistence for the user settings record and the best-effort
//! `version.json` bookkeeping. Sole writer of both files.

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::errors::StorageError;
use crate::models::{InstalledVersions, Settings};
use crate::utils::paths::LauncherPaths;

pub struct SettingsStore {
    paths: LauncherPaths,
    // Serializes writers; readers go straight to the filesystem and observe
    // either the old or the new file thanks to the rename below.
    write_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(paths: LauncherPaths) -> Self {
        Self {
            paths,
            write_lock: Mutex::new(()),
        }
    }

    /// Read persisted settings. A missing file means a fresh install and
    /// yields the all-default record; an unreadable or corrupt file degrades
    /// to defaults with a warning instead of blocking startup.
    pub fn load(&self) -> Settings {
        read_json_or_default(&self.paths.settings_file(), "settings")
    }

    pub fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        let _guard = self.lock();
        write_json_atomic(&self.paths.settings_file(), settings)
    }

    pub fn load_versions(&self) -> InstalledVersions {
        read_json_or_default(&self.paths.versions_file(), "version record")
    }

    pub fn save_versions(&self, versions: &InstalledVersions) -> Result<(), StorageError> {
        let _guard = self.lock();
        write_json_atomic(&self.paths.versions_file(), versions)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path, what: &str) -> T {
    if !path.exists() {
        return T::default();
    }
    let parsed = fs::read_to_string(path)
        .map_err(StorageError::from)
        .and_then(|content| Ok(serde_json::from_str(&content)?));
    match parsed {
        Ok(value) => value,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "corrupt {what}, falling back to defaults");
            T::default()
        }
    }
}

/// Write the serialized value next to `path` and rename it into place, so a
/// concurrent reader sees either the old or the new file, never a torn one.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_root;

    fn store() -> (SettingsStore, std::path::PathBuf) {
        let root = temp_root();
        (SettingsStore::new(LauncherPaths::new(&root)), root)
    }

    #[test]
    fn fresh_install_loads_defaults() {
        let (store, root) = store();
        assert_eq!(store.load(), Settings::default());
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn save_then_load_round_trips() {
        let (store, root) = store();

        let records = [
            Settings::default(),
            Settings {
                use_ruffle: Some(true),
                ..Settings::default()
            },
            Settings {
                flash_player_path: Some("/opt/flash/flashplayer".to_string()),
                use_ruffle: Some(false),
                ruffle_path: Some("/opt/ruffle/ruffle".to_string()),
                sound_enabled: Some(false),
            },
        ];

        for record in records {
            store.save(&record).unwrap();
            assert_eq!(store.load(), record);
        }
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn save_replaces_the_whole_record() {
        let (store, root) = store();
        store
            .save(&Settings {
                ruffle_path: Some("/tmp/ruffle".to_string()),
                ..Settings::default()
            })
            .unwrap();
        store
            .save(&Settings {
                sound_enabled: Some(false),
                ..Settings::default()
            })
            .unwrap();

        let loaded = store.load();
        assert_eq!(loaded.ruffle_path, None);
        assert_eq!(loaded.sound_enabled, Some(false));
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn corrupt_settings_degrade_to_defaults() {
        let (store, root) = store();
        fs::write(root.join("settings.json"), "{not json").unwrap();
        assert_eq!(store.load(), Settings::default());
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn no_temp_file_remains_after_save() {
        let (store, root) = store();
        store.save(&Settings::default()).unwrap();
        assert!(root.join("settings.json").exists());
        assert!(!root.join("settings.json.tmp").exists());
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn version_record_round_trips() {
        let (store, root) = store();
        let mut versions = InstalledVersions::default();
        versions.flash_player = "32.0.0.465".to_string();
        versions.games.insert("PTD2".to_string(), "1700000000".to_string());

        store.save_versions(&versions).unwrap();
        let loaded = store.load_versions();
        assert_eq!(loaded.flash_player, "32.0.0.465");
        assert_eq!(loaded.games.get("PTD2").map(String::as_str), Some("1700000000"));
        let _ = fs::remove_dir_all(root);
    }
}

//! The command boundary. The UI shell constructs one [`CommandDispatcher`]
//! at startup, invokes its methods as named commands, and watches
//! `download-progress` events through [`CommandDispatcher::subscribe`].
//! Download commands resolve only once the transfer has completed or
//! failed; interim state travels exclusively over the event bus.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::catalog::Catalog;
use crate::errors::{DownloadError, LaunchError, StorageError};
use crate::events::EventBus;
use crate::models::{DownloadProgress, GameId, ItemId, RuntimeKind, Settings};
use crate::services::{
    DownloadManager, GameLauncher, InstallProbe, RuntimeResolver, SettingsStore,
};
use crate::utils::paths::LauncherPaths;

pub struct CommandDispatcher {
    store: Arc<SettingsStore>,
    // In-memory copy of the persisted record; updated on save so readers
    // never race a half-written file.
    settings: Mutex<Settings>,
    probe: InstallProbe,
    downloads: DownloadManager,
    launcher: GameLauncher,
    events: EventBus,
}

impl CommandDispatcher {
    /// Wire the component graph over `paths` and `catalog` and load the
    /// persisted settings. Fails only when the directory tree cannot be
    /// created.
    pub fn new(paths: LauncherPaths, catalog: Catalog) -> Result<Self, StorageError> {
        paths.ensure_dirs()?;

        let catalog = Arc::new(catalog);
        let store = Arc::new(SettingsStore::new(paths.clone()));
        let settings = Mutex::new(store.load());
        let events = EventBus::default();
        let probe = InstallProbe::new(paths.clone(), Arc::clone(&catalog));
        let resolver = RuntimeResolver::new(probe.clone());
        let launcher = GameLauncher::new(probe.clone(), resolver, Arc::clone(&catalog));
        let downloads = DownloadManager::new(paths, catalog, Arc::clone(&store), events.clone());

        Ok(Self {
            store,
            settings,
            probe,
            downloads,
            launcher,
            events,
        })
    }

    /// Discover the data root and use the built-in catalog.
    pub fn with_default_paths() -> Result<Self, StorageError> {
        let paths = LauncherPaths::discover();
        let catalog = Catalog::load_or_default(&paths.root().join("config.json"));
        Self::new(paths, catalog)
    }

    /// Attach a `download-progress` listener.
    pub fn subscribe(&self) -> broadcast::Receiver<DownloadProgress> {
        self.events.subscribe()
    }

    // Flash commands

    pub fn check_flash_installed(&self) -> bool {
        self.probe
            .runtime_installed(RuntimeKind::Flash, &self.current_settings())
    }

    pub fn get_flash_path(&self) -> PathBuf {
        self.probe
            .runtime_path(RuntimeKind::Flash, &self.current_settings())
    }

    pub async fn download_flash(&self) -> Result<PathBuf, DownloadError> {
        self.downloads
            .download(ItemId::Runtime(RuntimeKind::Flash))
            .await
    }

    // Ruffle commands

    pub fn check_ruffle_installed(&self) -> bool {
        self.probe
            .runtime_installed(RuntimeKind::Ruffle, &self.current_settings())
    }

    pub fn get_ruffle_path(&self) -> PathBuf {
        self.probe
            .runtime_path(RuntimeKind::Ruffle, &self.current_settings())
    }

    pub async fn download_ruffle(&self) -> Result<PathBuf, DownloadError> {
        self.downloads
            .download(ItemId::Runtime(RuntimeKind::Ruffle))
            .await
    }

    // Game commands

    pub fn is_game_downloaded(&self, game: GameId) -> bool {
        self.probe.game_installed(game)
    }

    pub fn get_game_path(&self, game: GameId) -> Option<PathBuf> {
        self.probe.installed_game_path(game)
    }

    pub async fn download_game(&self, game: GameId) -> Result<PathBuf, DownloadError> {
        self.downloads.download(ItemId::Game(game)).await
    }

    pub fn launch_game(&self, game: GameId) -> Result<(), LaunchError> {
        self.launcher.launch(game, &self.current_settings())
    }

    // Settings commands

    pub fn get_settings(&self) -> Settings {
        self.current_settings()
    }

    pub fn save_settings(&self, settings: Settings) -> Result<(), StorageError> {
        {
            let mut guard = match self.settings.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *guard = settings.clone();
        }
        self.store.save(&settings)
    }

    fn current_settings(&self) -> Settings {
        match self.settings.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::models::DownloadStatus;
    use crate::test_support::{temp_root, HttpStub};

    fn dispatcher(catalog: Catalog) -> (CommandDispatcher, std::path::PathBuf) {
        let root = temp_root();
        let dispatcher = CommandDispatcher::new(LauncherPaths::new(&root), catalog).unwrap();
        (dispatcher, root)
    }

    #[test]
    fn settings_round_trip_through_the_dispatcher() {
        let (dispatcher, root) = dispatcher(Catalog::default());
        assert_eq!(dispatcher.get_settings(), Settings::default());

        let record = Settings {
            use_ruffle: Some(true),
            sound_enabled: Some(false),
            ..Settings::default()
        };
        dispatcher.save_settings(record.clone()).unwrap();
        assert_eq!(dispatcher.get_settings(), record);

        // A fresh dispatcher over the same root sees the persisted record.
        let reopened =
            CommandDispatcher::new(LauncherPaths::new(&root), Catalog::default()).unwrap();
        assert_eq!(reopened.get_settings(), record);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn path_commands_reflect_setting_overrides() {
        let (dispatcher, root) = dispatcher(Catalog::default());

        let default_flash = dispatcher.get_flash_path();
        assert!(default_flash.starts_with(root.join("Flash")));
        assert!(dispatcher.get_ruffle_path().starts_with(root.join("Ruffle")));

        dispatcher
            .save_settings(Settings {
                flash_player_path: Some("/custom/flash".to_string()),
                ..Settings::default()
            })
            .unwrap();
        assert_eq!(dispatcher.get_flash_path(), PathBuf::from("/custom/flash"));

        // Switching the runtime flag never touches installation state.
        assert!(!dispatcher.check_flash_installed());
        assert!(!dispatcher.check_ruffle_installed());
        let _ = fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn fresh_install_scenario() {
        let body = vec![0x46u8; 32 * 1024];
        let base = HttpStub::with_body(body.clone()).spawn();
        let mut catalog = Catalog::default();
        catalog
            .game_urls
            .insert("PTD2".to_string(), format!("{base}/ptd2-latest.swf"));

        let (dispatcher, root) = dispatcher(catalog);
        let mut rx = dispatcher.subscribe();

        // Fresh install: all defaults, nothing downloaded.
        assert_eq!(dispatcher.get_settings(), Settings::default());
        assert!(!dispatcher.is_game_downloaded(GameId::Ptd2));
        assert_eq!(dispatcher.get_game_path(GameId::Ptd2), None);

        let path = dispatcher.download_game(GameId::Ptd2).await.unwrap();
        assert!(dispatcher.is_game_downloaded(GameId::Ptd2));
        assert_eq!(dispatcher.get_game_path(GameId::Ptd2), Some(path));

        // Monotone progress ending in a single completed event at 100.
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        let mut previous = 0;
        for event in &events {
            assert!(event.progress >= previous);
            previous = event.progress;
        }
        let last = events.last().unwrap();
        assert_eq!(last.status, DownloadStatus::Completed);
        assert_eq!(last.progress, 100);

        // Default runtime is Flash and it is not installed.
        let err = dispatcher.launch_game(GameId::Ptd2).unwrap_err();
        assert!(matches!(
            err,
            LaunchError::RuntimeNotInstalled(RuntimeKind::Flash)
        ));
        let _ = fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn download_command_returns_the_failure() {
        let base = HttpStub {
            status: 500,
            ..HttpStub::default()
        }
        .spawn();
        let mut catalog = Catalog::default();
        catalog
            .game_urls
            .insert("PTD1".to_string(), format!("{base}/ptd1-latest.swf"));

        let (dispatcher, root) = dispatcher(catalog);
        let err = dispatcher.download_game(GameId::Ptd1).await.unwrap_err();
        assert!(matches!(err, DownloadError::Network(_)));
        assert!(!dispatcher.is_game_downloaded(GameId::Ptd1));
        let _ = fs::remove_dir_all(root);
    }
}

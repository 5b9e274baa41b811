pub mod download_manager;
pub mod game_launcher;
pub mod install_probe;
pub mod runtime_resolver;
pub mod settings_store;

pub use download_manager::DownloadManager;
pub use game_launcher::GameLauncher;
pub use install_probe::{InstallProbe, MIN_INSTALLED_SIZE};
pub use runtime_resolver::RuntimeResolver;
pub use settings_store::SettingsStore;

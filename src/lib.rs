//! Backend orchestration core for the PTD launcher.
//!
//! Manages a small fixed catalog of downloadable runtimes (Flash Player,
//! Ruffle) and game payloads (six PTD variants): settings persistence,
//! installation-state detection, streamed downloads with progress events,
//! and runtime-aware process launch. The UI shell talks to this crate
//! through [`CommandDispatcher`] and the `download-progress` event bus; no
//! rendering or packaging concerns live here.

pub mod catalog;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod logging;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::Catalog;
pub use dispatcher::CommandDispatcher;
pub use errors::{DownloadError, LaunchError, StorageError};
pub use events::EventBus;
pub use models::{
    DownloadProgress, DownloadStatus, GameId, ItemId, RuntimeChoice, RuntimeKind, Settings,
};
pub use utils::paths::LauncherPaths;

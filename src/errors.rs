use std::io;

use thiserror::Error;

use crate::models::{GameId, ItemId, RuntimeKind};

/// Settings / version storage failures.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failures of a single download attempt.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("a download for '{0}' is already in progress")]
    AlreadyInProgress(ItemId),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Write error: {0}")]
    Write(#[from] io::Error),
    #[error("Catalog mismatch: {0}")]
    CatalogMismatch(String),
}

/// Failures while launching a game through the resolved runtime.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("game '{0}' is not installed")]
    GameNotInstalled(GameId),
    #[error("{0} is not installed")]
    RuntimeNotInstalled(RuntimeKind),
    #[error("failed to spawn runtime: {0}")]
    Spawn(#[from] io::Error),
}

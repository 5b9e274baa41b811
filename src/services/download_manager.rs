//! Catalog downloads: streamed fetch with progress events, at-most-one
//! in-flight transfer per item, and atomic installation. Payloads are
//! written to a staging file and only renamed (or extracted) into the
//! canonical location after the full transfer succeeds, so the install
//! probe can never observe a half-written file.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::errors::DownloadError;
use crate::events::EventBus;
use crate::models::{DownloadProgress, DownloadStatus, GameId, ItemId, RuntimeKind};
use crate::services::SettingsStore;
use crate::utils::paths::LauncherPaths;

/// Cap on any single payload, against disk exhaustion from a bad source.
const MAX_DOWNLOAD_SIZE: u64 = 500 * 1024 * 1024;
/// Progress cadence when the source sends no Content-Length.
const UNKNOWN_TOTAL_STEP_BYTES: u64 = 256 * 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct DownloadManager {
    client: reqwest::Client,
    paths: LauncherPaths,
    catalog: Arc<Catalog>,
    store: Arc<SettingsStore>,
    events: EventBus,
    active: Arc<Mutex<HashSet<ItemId>>>,
}

struct Transfer {
    downloaded: u64,
    total: u64,
}

impl DownloadManager {
    pub fn new(
        paths: LauncherPaths,
        catalog: Arc<Catalog>,
        store: Arc<SettingsStore>,
        events: EventBus,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            paths,
            catalog,
            store,
            events,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Run the full download for `item` and return the installed path.
    ///
    /// Rejects with [`DownloadError::AlreadyInProgress`] while a transfer for
    /// the same item is active, so callers can tell "already running" apart
    /// from "already done". Emits exactly one terminal event per attempt.
    pub async fn download(&self, item: ItemId) -> Result<PathBuf, DownloadError> {
        let _slot = ActiveSlot::acquire(&self.active, item)?;
        self.emit(item, 0, 0, 0, DownloadStatus::Starting);

        match self.run(item).await {
            Ok((path, transfer)) => {
                self.emit(
                    item,
                    100,
                    transfer.downloaded,
                    transfer.total,
                    DownloadStatus::Completed,
                );
                self.record_install(item);
                info!(item = %item, path = %path.display(), bytes = transfer.downloaded, "download complete");
                Ok(path)
            }
            Err(err) => {
                warn!(item = %item, error = %err, "download failed");
                self.emit(item, 0, 0, 0, DownloadStatus::Failed);
                Err(err)
            }
        }
    }

    async fn run(&self, item: ItemId) -> Result<(PathBuf, Transfer), DownloadError> {
        match item {
            ItemId::Game(game) => self.download_game(game).await,
            ItemId::Runtime(kind) => self.download_runtime(kind).await,
        }
    }

    async fn download_game(&self, game: GameId) -> Result<(PathBuf, Transfer), DownloadError> {
        let url = self
            .catalog
            .game_url(game)
            .ok_or_else(|| {
                DownloadError::CatalogMismatch(format!("game '{game}' is not in the catalog"))
            })?
            .to_string();

        let games_dir = self.paths.games_dir();
        fs::create_dir_all(&games_dir)?;
        let dest = games_dir.join(format!("{}.swf", game.id()));
        let staging = staging_path(&dest);

        let transfer = self.fetch(ItemId::Game(game), &url, &staging).await?;
        fs::rename(&staging, &dest)?;
        Ok((dest, transfer))
    }

    async fn download_runtime(
        &self,
        kind: RuntimeKind,
    ) -> Result<(PathBuf, Transfer), DownloadError> {
        let (primary, fallback, filename) = match kind {
            RuntimeKind::Flash => {
                let target = self.catalog.flash();
                (
                    target.primary_url.clone(),
                    target.fallback_url.clone(),
                    target.filename.clone(),
                )
            }
            RuntimeKind::Ruffle => {
                let target = self.catalog.ruffle();
                (target.url.clone(), None, target.filename.clone())
            }
        };

        let item = ItemId::Runtime(kind);
        let dir = self.paths.runtime_dir(kind);
        fs::create_dir_all(&dir)?;
        let staging = dir.join(format!("{}.download", remote_file_name(&primary)));

        let mut source_url = primary.clone();
        let transfer = match self.fetch(item, &primary, &staging).await {
            Ok(transfer) => transfer,
            Err(primary_err) => {
                let Some(fallback) = fallback else {
                    return Err(primary_err);
                };
                warn!(item = %item, error = %primary_err, "primary source failed, trying fallback");
                source_url = fallback.clone();
                self.fetch(item, &fallback, &staging).await?
            }
        };

        let final_path = self.install_runtime(&staging, &dir, &filename, &source_url)?;
        Ok((final_path, transfer))
    }

    /// Move or unpack the staged payload into its canonical location.
    fn install_runtime(
        &self,
        staging: &Path,
        dir: &Path,
        filename: &str,
        source_url: &str,
    ) -> Result<PathBuf, DownloadError> {
        let final_path = dir.join(filename);
        match ArchiveKind::detect(source_url) {
            None => fs::rename(staging, &final_path)?,
            Some(ArchiveKind::Zip) => {
                extract_zip(staging, dir)?;
                let _ = fs::remove_file(staging);
            }
            Some(ArchiveKind::TarGz) => {
                extract_tar_gz(staging, dir)?;
                let _ = fs::remove_file(staging);
            }
            Some(ArchiveKind::Dmg) => {
                #[cfg(target_os = "macos")]
                {
                    extract_dmg(staging, dir, filename)?;
                    let _ = fs::remove_file(staging);
                }
                #[cfg(not(target_os = "macos"))]
                {
                    let _ = fs::remove_file(staging);
                    return Err(DownloadError::CatalogMismatch(format!(
                        "dmg payloads are only supported on macOS: {source_url}"
                    )));
                }
            }
        }
        make_executable(&final_path)?;
        Ok(final_path)
    }

    /// Stream `url` into `dest`, cleaning the staging file up on failure.
    async fn fetch(&self, item: ItemId, url: &str, dest: &Path) -> Result<Transfer, DownloadError> {
        let result = self.stream_to_file(item, url, dest).await;
        if result.is_err() {
            let _ = fs::remove_file(dest);
        }
        result
    }

    async fn stream_to_file(
        &self,
        item: ItemId,
        url: &str,
        dest: &Path,
    ) -> Result<Transfer, DownloadError> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        let total = response.content_length().unwrap_or(0);
        if total > MAX_DOWNLOAD_SIZE {
            return Err(DownloadError::CatalogMismatch(format!(
                "remote payload of {total} bytes exceeds the {MAX_DOWNLOAD_SIZE} byte cap"
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;
        let mut last_percent: u32 = 0;
        let mut last_emitted_bytes: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            downloaded += chunk.len() as u64;
            if downloaded > MAX_DOWNLOAD_SIZE {
                return Err(DownloadError::CatalogMismatch(
                    "download exceeded the maximum allowed size".to_string(),
                ));
            }
            file.write_all(&chunk).await?;

            if total > 0 {
                // 100 is reserved for the terminal completed event.
                let percent = (((downloaded as f64 / total as f64) * 100.0) as u32).min(99);
                if percent > last_percent {
                    last_percent = percent;
                    self.emit(item, percent, downloaded, total, DownloadStatus::InProgress);
                }
            } else if downloaded - last_emitted_bytes >= UNKNOWN_TOTAL_STEP_BYTES {
                last_emitted_bytes = downloaded;
                self.emit(item, 0, downloaded, 0, DownloadStatus::InProgress);
            }
        }

        file.flush().await?;
        Ok(Transfer { downloaded, total })
    }

    fn emit(
        &self,
        item: ItemId,
        progress: u32,
        downloaded: u64,
        total: u64,
        status: DownloadStatus,
    ) {
        self.events.publish(DownloadProgress {
            item,
            progress,
            downloaded,
            total,
            status,
        });
    }

    /// Best-effort version bookkeeping; never fails the download.
    fn record_install(&self, item: ItemId) {
        let mut versions = self.store.load_versions();
        let stamp = chrono::Utc::now().timestamp().to_string();
        match item {
            ItemId::Runtime(RuntimeKind::Flash) => {
                versions.flash_player = self.catalog.flash_version().to_string();
            }
            ItemId::Runtime(RuntimeKind::Ruffle) => versions.ruffle = stamp,
            ItemId::Game(game) => {
                versions.games.insert(game.id().to_string(), stamp);
            }
        }
        if let Err(err) = self.store.save_versions(&versions) {
            warn!(item = %item, error = %err, "failed to update version record");
        }
    }
}

/// Registry slot marking an item as in-flight; released on drop so every
/// exit path (success, failure, panic unwind) frees the identity.
struct ActiveSlot {
    active: Arc<Mutex<HashSet<ItemId>>>,
    item: ItemId,
}

impl ActiveSlot {
    fn acquire(active: &Arc<Mutex<HashSet<ItemId>>>, item: ItemId) -> Result<Self, DownloadError> {
        let mut set = lock_set(active);
        if !set.insert(item) {
            return Err(DownloadError::AlreadyInProgress(item));
        }
        drop(set);
        Ok(Self {
            active: Arc::clone(active),
            item,
        })
    }
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        lock_set(&self.active).remove(&self.item);
    }
}

fn lock_set(set: &Mutex<HashSet<ItemId>>) -> MutexGuard<'_, HashSet<ItemId>> {
    match set.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArchiveKind {
    Zip,
    TarGz,
    Dmg,
}

impl ArchiveKind {
    /// Anything else is treated as a directly runnable payload.
    fn detect(url: &str) -> Option<Self> {
        if url.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else if url.ends_with(".tar.gz") || url.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if url.ends_with(".dmg") {
            Some(ArchiveKind::Dmg)
        } else {
            None
        }
    }
}

fn remote_file_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or("payload")
}

fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), DownloadError> {
    let file = fs::File::open(archive)?;
    let mut archive = zip::ZipArchive::new(file).map_err(io::Error::from)?;
    archive.extract(dest).map_err(io::Error::from)?;
    Ok(())
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<(), DownloadError> {
    let file = fs::File::open(archive)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    archive.unpack(dest)?;
    Ok(())
}

fn make_executable(path: &Path) -> Result<(), DownloadError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if path.exists() {
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o755);
            fs::set_permissions(path, perms)?;
        }
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn extract_dmg(dmg_path: &Path, dest: &Path, app_name: &str) -> Result<(), DownloadError> {
    use std::process::Command;

    let mount_point = std::env::temp_dir().join("ptd-launcher-dmg");
    fs::create_dir_all(&mount_point)?;

    let attach = Command::new("hdiutil")
        .arg("attach")
        .arg(dmg_path)
        .arg("-mountpoint")
        .arg(&mount_point)
        .output()?;
    if !attach.status.success() {
        return Err(DownloadError::CatalogMismatch(format!(
            "hdiutil attach failed: {}",
            String::from_utf8_lossy(&attach.stderr)
        )));
    }

    let source = mount_point.join(app_name);
    let copy = Command::new("cp").arg("-R").arg(&source).arg(dest).output();

    let detach = Command::new("hdiutil")
        .arg("detach")
        .arg(&mount_point)
        .output();
    if let Ok(out) = detach {
        if !out.status.success() {
            warn!(
                "failed to unmount dmg: {}",
                String::from_utf8_lossy(&out.stderr)
            );
        }
    }
    let _ = fs::remove_dir_all(&mount_point);

    let copy = copy?;
    if !copy.status.success() {
        return Err(DownloadError::Write(io::Error::new(
            io::ErrorKind::Other,
            format!(
                "copying the app bundle failed: {}",
                String::from_utf8_lossy(&copy.stderr)
            ),
        )));
    }
    Ok(())
}

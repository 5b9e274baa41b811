//! Spawns the resolved runtime with a game payload. The child is fully
//! detached: no supervision, no IPC, nothing shared after the spawn call.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use tracing::info;

use crate::catalog::Catalog;
use crate::errors::LaunchError;
use crate::models::{GameId, RuntimeChoice, RuntimeKind, Settings};
use crate::services::{InstallProbe, RuntimeResolver};

#[derive(Clone)]
pub struct GameLauncher {
    probe: InstallProbe,
    resolver: RuntimeResolver,
    catalog: Arc<Catalog>,
}

impl GameLauncher {
    pub fn new(probe: InstallProbe, resolver: RuntimeResolver, catalog: Arc<Catalog>) -> Self {
        Self {
            probe,
            resolver,
            catalog,
        }
    }

    /// Validate the game, then the runtime, then spawn. Both checks re-read
    /// the filesystem; installation state may have changed since the caller
    /// last looked.
    pub fn launch(&self, game: GameId, settings: &Settings) -> Result<(), LaunchError> {
        let game_path = self
            .probe
            .installed_game_path(game)
            .ok_or(LaunchError::GameNotInstalled(game))?;

        let choice = self.resolver.resolve(settings);
        if !self.probe.is_installed(&choice.executable) {
            return Err(LaunchError::RuntimeNotInstalled(choice.kind));
        }

        let mut command = self.build_command(&choice, &game_path, game);
        let child = command.spawn()?;
        info!(
            game = %game,
            runtime = %choice.kind,
            pid = child.id(),
            "game launched"
        );
        Ok(())
    }

    fn build_command(&self, choice: &RuntimeChoice, game_path: &Path, game: GameId) -> Command {
        #[cfg(target_os = "macos")]
        if choice.kind == RuntimeKind::Flash {
            // Flash ships as an .app bundle on macOS.
            let mut command = Command::new("open");
            command.arg("-a").arg(&choice.executable).arg(game_path);
            return command;
        }

        let mut command = Command::new(&choice.executable);
        command.arg(game_path);

        if choice.kind == RuntimeKind::Ruffle {
            // The game servers key save data off the request URL, so Ruffle
            // must present the original hosted URL instead of a file path.
            if let Some(url) = self.catalog.game_url(game) {
                command
                    .arg("--spoof-url")
                    .arg(url)
                    .arg("--base")
                    .arg(base_url(url));
            }
        }
        command
    }
}

/// Everything up to and including the last `/` of a payload URL.
fn base_url(url: &str) -> &str {
    match url.rfind('/') {
        Some(idx) => &url[..=idx],
        None => url,
    }
}

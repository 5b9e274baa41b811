//! Maps current settings to the player that will execute game assets.

use crate::models::{RuntimeChoice, RuntimeKind, Settings};
use crate::services::InstallProbe;

#[derive(Clone)]
pub struct RuntimeResolver {
    probe: InstallProbe,
}

impl RuntimeResolver {
    pub fn new(probe: InstallProbe) -> Self {
        Self { probe }
    }

    /// Pure function of settings: Ruffle iff `use_ruffle` is set, else
    /// Flash, together with that runtime's effective executable path.
    pub fn resolve(&self, settings: &Settings) -> RuntimeChoice {
        let kind = if settings.use_ruffle() {
            RuntimeKind::Ruffle
        } else {
            RuntimeKind::Flash
        };
        RuntimeChoice {
            kind,
            executable: self.probe.runtime_path(kind, settings),
        }
    }
}

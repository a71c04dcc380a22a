use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::io_atomic;

use super::types::PluginSettings;

pub const ENV_API: &str = "DAILY_RECORD_API";
pub const ENV_TOKEN: &str = "DAILY_RECORD_TOKEN";

/// Where the note app keeps this plugin's `data.json` inside a vault.
pub fn default_settings_path(vault_root: &Path) -> PathBuf {
    vault_root
        .join(".obsidian")
        .join("plugins")
        .join("periodic-para")
        .join("data.json")
}

pub fn load_env_files() {
    let _ = dotenvy::from_filename(".env");
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the settings file; a missing file yields the defaults.
    pub fn load(&self) -> SyncResult<PluginSettings> {
        let settings = match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<PluginSettings>(&bytes).map_err(|e| {
                SyncError::Config(format!("invalid settings file {}: {e}", self.path.display()))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "settings file missing, using defaults");
                PluginSettings::default()
            }
            Err(err) => return Err(err.into()),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Replaces the whole file. Callers reload every component built from
    /// the previous settings afterwards.
    pub fn save(&self, settings: &PluginSettings) -> SyncResult<()> {
        settings.validate()?;
        let bytes = serde_json::to_vec_pretty(settings)?;
        io_atomic::write_atomic(&self.path, &bytes)?;
        info!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

/// Applies `DAILY_RECORD_API` / `DAILY_RECORD_TOKEN` on top of the file
/// values. Overrides are never written back.
pub fn apply_env_overrides(mut settings: PluginSettings) -> PluginSettings {
    let read = |key: &str| {
        std::env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    if let Some(api) = read(ENV_API) {
        settings.daily_record_api = api;
    }
    if let Some(token) = read(ENV_TOKEN) {
        settings.daily_record_token = token;
    }
    settings
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use time::UtcOffset;

use crate::error::SyncResult;
use crate::i18n::Locale;
use crate::notify::Notifier;
use crate::record::{HttpRecordFetcher, RecordSource};
use crate::settings::PluginSettings;
use crate::vault::{FsVault, Vault};

use super::state::SyncStateStore;

/// Everything one orchestrator instance runs against. Built from a settings
/// snapshot; a settings change builds a new context.
pub struct SyncContext {
    pub settings: PluginSettings,
    pub source: Arc<dyn RecordSource>,
    pub vault: Arc<dyn Vault>,
    pub notifier: Arc<dyn Notifier>,
    pub state: SyncStateStore,
    pub offset: UtcOffset,
    pub locale: Locale,
}

/// Sync state file kept next to the settings file.
pub fn default_state_path(settings_path: &Path) -> PathBuf {
    settings_path.with_file_name("sync-state.json")
}

impl SyncContext {
    pub fn for_vault(
        settings: PluginSettings,
        vault_root: &Path,
        state_path: Option<PathBuf>,
        offset: UtcOffset,
        locale: Locale,
        notifier: Arc<dyn Notifier>,
    ) -> SyncResult<Self> {
        let source = Arc::new(HttpRecordFetcher::new(&settings)?);
        let state = SyncStateStore::open(state_path, &settings);
        Ok(Self {
            source,
            vault: Arc::new(FsVault::new(vault_root)),
            notifier,
            state,
            offset,
            locale,
            settings,
        })
    }
}

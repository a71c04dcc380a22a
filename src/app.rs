use std::path::PathBuf;
use std::sync::Arc;

use time::UtcOffset;
use tracing::info;

use crate::error::SyncResult;
use crate::i18n::Locale;
use crate::notify::Notifier;
use crate::settings::{apply_env_overrides, PluginSettings, SettingsStore};
use crate::sync::{default_state_path, Scheduler, SyncContext, SyncOrchestrator};

#[derive(Debug, Clone)]
pub struct AppOptions {
    pub vault_root: PathBuf,
    pub settings_path: PathBuf,
    pub offset: UtcOffset,
    pub locale: Locale,
}

/// Long-lived application: settings, the orchestrator built from them, and
/// the timers driving it.
pub struct App {
    options: AppOptions,
    store: SettingsStore,
    notifier: Arc<dyn Notifier>,
    orchestrator: Arc<SyncOrchestrator>,
    scheduler: Scheduler,
}

fn build_orchestrator(
    options: &AppOptions,
    settings: PluginSettings,
    notifier: Arc<dyn Notifier>,
) -> SyncResult<Arc<SyncOrchestrator>> {
    let ctx = SyncContext::for_vault(
        settings,
        &options.vault_root,
        Some(default_state_path(&options.settings_path)),
        options.offset,
        options.locale,
        notifier,
    )?;
    Ok(Arc::new(SyncOrchestrator::new(ctx)))
}

impl App {
    pub fn load(options: AppOptions, notifier: Arc<dyn Notifier>) -> SyncResult<Self> {
        Self::with_scheduler(options, notifier, Scheduler::default())
    }

    pub fn with_scheduler(
        options: AppOptions,
        notifier: Arc<dyn Notifier>,
        scheduler: Scheduler,
    ) -> SyncResult<Self> {
        let store = SettingsStore::new(options.settings_path.clone());
        let settings = apply_env_overrides(store.load()?);
        let orchestrator = build_orchestrator(&options, settings, notifier.clone())?;
        Ok(Self {
            options,
            store,
            notifier,
            orchestrator,
            scheduler,
        })
    }

    pub fn orchestrator(&self) -> Arc<SyncOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    pub fn settings(&self) -> &PluginSettings {
        self.orchestrator.settings()
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn start(&mut self) {
        info!(vault = %self.options.vault_root.display(), "starting daily record sync timers");
        self.scheduler.start(self.orchestrator());
    }

    /// Cancels both timers and stops the current orchestrator from writing.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.orchestrator.shutdown();
    }

    /// Persists `settings` in full, then rebuilds everything from the file.
    /// Running timers are restarted against the new orchestrator.
    pub fn save_settings(&mut self, settings: PluginSettings) -> SyncResult<()> {
        self.store.save(&settings)?;
        let reloaded = apply_env_overrides(self.store.load()?);
        let next = build_orchestrator(&self.options, reloaded, self.notifier.clone())?;

        let was_running = self.scheduler.is_running();
        self.stop();
        self.orchestrator = next;
        if was_running {
            self.start();
        }
        Ok(())
    }
}

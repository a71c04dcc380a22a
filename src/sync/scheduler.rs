use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::orchestrator::SyncOrchestrator;

pub const STARTUP_DELAY: Duration = Duration::from_secs(15);
pub const SYNC_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Owns the two timers that trigger `sync`: a one-shot shortly after start
/// and a fixed interval.
pub struct Scheduler {
    startup_delay: Duration,
    interval: Duration,
    timers: Option<(CancellationToken, JoinHandle<()>)>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(STARTUP_DELAY, SYNC_INTERVAL)
    }
}

impl Scheduler {
    pub fn new(startup_delay: Duration, interval: Duration) -> Self {
        Self {
            startup_delay,
            interval,
            timers: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.timers.is_some()
    }

    /// Starts the timers, replacing any previous ones.
    pub fn start(&mut self, orchestrator: Arc<SyncOrchestrator>) {
        self.stop();
        let token = CancellationToken::new();
        let handle = tokio::spawn(run_timers(
            orchestrator,
            token.clone(),
            self.startup_delay,
            self.interval,
        ));
        self.timers = Some((token, handle));
    }

    /// Cancels both timers. A sync already running is not interrupted.
    pub fn stop(&mut self) {
        if let Some((token, _handle)) = self.timers.take() {
            token.cancel();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_timers(
    orchestrator: Arc<SyncOrchestrator>,
    token: CancellationToken,
    startup_delay: Duration,
    interval: Duration,
) {
    let startup = tokio::time::sleep(startup_delay);
    tokio::pin!(startup);
    let mut started = false;
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = &mut startup, if !started => {
                started = true;
                trigger(&orchestrator, "startup");
            }
            _ = ticker.tick() => trigger(&orchestrator, "interval"),
        }
    }
    debug!("sync timers stopped");
}

fn trigger(orchestrator: &Arc<SyncOrchestrator>, reason: &'static str) {
    let orchestrator = Arc::clone(orchestrator);
    tokio::spawn(async move {
        let outcome = orchestrator.sync().await;
        debug!(reason, ?outcome, "scheduled sync finished");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncResult;
    use crate::i18n::Locale;
    use crate::notify::LogNotifier;
    use crate::record::{DailyRecord, RecordSource};
    use crate::settings::PluginSettings;
    use crate::sync::context::SyncContext;
    use crate::sync::state::SyncStateStore;
    use crate::vault::FsVault;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::UtcOffset;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RecordSource for CountingSource {
        async fn fetch(&self, _since: Option<i64>) -> SyncResult<Vec<DailyRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn orchestrator(source: Arc<CountingSource>) -> Arc<SyncOrchestrator> {
        let settings = PluginSettings {
            daily_record_api: "https://memos.example.com/api/memo".to_string(),
            daily_record_token: "token".to_string(),
            ..PluginSettings::default()
        };
        Arc::new(SyncOrchestrator::new(SyncContext {
            state: SyncStateStore::in_memory(&settings),
            settings,
            source,
            vault: Arc::new(FsVault::new(std::env::temp_dir().join("pp-scheduler-unused"))),
            notifier: Arc::new(LogNotifier),
            offset: UtcOffset::UTC,
            locale: Locale::En,
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_startup_delay_then_every_interval_until_stopped() {
        let source = Arc::new(CountingSource::default());
        let mut scheduler = Scheduler::default();
        scheduler.start(orchestrator(source.clone()));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(SYNC_INTERVAL).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        scheduler.stop();
        assert!(!scheduler.is_running());
        tokio::time::sleep(SYNC_INTERVAL * 4).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_previous_timers() {
        let source = Arc::new(CountingSource::default());
        let orchestrator = orchestrator(source.clone());
        let mut scheduler = Scheduler::new(Duration::from_secs(1), Duration::from_secs(60));
        scheduler.start(orchestrator.clone());
        scheduler.start(orchestrator);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}

use std::collections::BTreeMap;
use std::sync::Mutex;

use time::{macros::format_description, Date, OffsetDateTime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::daily_note::{DailyNoteMerger, LineStyle, MergeOutcome};
use crate::error::SyncError;
use crate::i18n::{self, Message};
use crate::notify::NoticeLevel;
use crate::record::DailyRecord;

use super::context::SyncContext;
use super::state::section_fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Merging,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Skips days whose rendered section has not changed since the last run.
    Normal,
    /// Full fetch, every day rewritten.
    Force,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub notes_updated: usize,
    pub notes_unchanged: usize,
    pub notes_skipped: usize,
    pub notes_missing: usize,
    pub failures: usize,
}

#[derive(Debug)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Another sync was in flight; this trigger was dropped.
    Skipped,
    /// Teardown began; nothing further was written.
    Cancelled,
    Failed(SyncError),
}

/// Drives fetch + merge. At most one run is active at a time; overlapping
/// triggers are dropped rather than queued.
pub struct SyncOrchestrator {
    ctx: SyncContext,
    merger: DailyNoteMerger,
    gate: tokio::sync::Mutex<()>,
    phase: Mutex<SyncPhase>,
    shutdown: CancellationToken,
}

fn resource_origin(api: &str) -> Option<Url> {
    let url = Url::parse(api.trim()).ok()?;
    Url::parse(&url.origin().ascii_serialization()).ok()
}

fn date_key(date: Date) -> String {
    crate::daily_note::format_date("YYYY-MM-DD", date, time::Weekday::Monday)
}

fn parse_date_key(key: &str) -> Option<Date> {
    Date::parse(key, format_description!("[year]-[month]-[day]")).ok()
}

impl SyncOrchestrator {
    pub fn new(ctx: SyncContext) -> Self {
        let shutdown = CancellationToken::new();
        let style = LineStyle {
            offset: ctx.offset,
            resource_origin: resource_origin(&ctx.settings.daily_record_api),
        };
        let merger = DailyNoteMerger::new(
            ctx.vault.clone(),
            ctx.settings.daily_note_path.clone(),
            ctx.settings.week_start_day(),
            style,
            shutdown.clone(),
        );
        Self {
            ctx,
            merger,
            gate: tokio::sync::Mutex::new(()),
            phase: Mutex::new(SyncPhase::Idle),
            shutdown,
        }
    }

    pub fn settings(&self) -> &crate::settings::PluginSettings {
        &self.ctx.settings
    }

    pub fn phase(&self) -> SyncPhase {
        *self.phase.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_phase(&self, next: SyncPhase) {
        let mut phase = self.phase.lock().unwrap_or_else(|p| p.into_inner());
        if *phase != next {
            debug!(from = ?*phase, to = ?next, "sync phase");
            *phase = next;
        }
    }

    /// Stops this instance for good: no note is written after this returns,
    /// an in-flight fetch may still finish.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub async fn sync(&self) -> SyncOutcome {
        self.run(SyncMode::Normal).await
    }

    pub async fn force_sync(&self) -> SyncOutcome {
        self.run(SyncMode::Force).await
    }

    pub async fn run(&self, mode: SyncMode) -> SyncOutcome {
        let Ok(_guard) = self.gate.try_lock() else {
            debug!(?mode, "sync already in flight, trigger ignored");
            return SyncOutcome::Skipped;
        };
        if self.shutdown.is_cancelled() {
            return SyncOutcome::Cancelled;
        }

        let outcome = self.run_locked(mode).await;
        match &outcome {
            SyncOutcome::Failed(err) => {
                self.set_phase(SyncPhase::Error);
                self.report_failure(err);
            }
            SyncOutcome::Completed(report) => {
                info!(?mode, ?report, "daily record sync finished");
            }
            SyncOutcome::Cancelled => info!(?mode, "daily record sync cancelled by shutdown"),
            SyncOutcome::Skipped => {}
        }
        self.set_phase(SyncPhase::Idle);
        outcome
    }

    fn local_date(&self, ts: i64) -> Option<Date> {
        OffsetDateTime::from_unix_timestamp(ts)
            .ok()
            .map(|t| t.to_offset(self.ctx.offset).date())
    }

    async fn run_locked(&self, mode: SyncMode) -> SyncOutcome {
        let settings = &self.ctx.settings;
        if !settings.has_remote() {
            return SyncOutcome::Failed(SyncError::Config(
                "dailyRecordAPI and dailyRecordToken must both be set".to_string(),
            ));
        }

        let mut state = self.ctx.state.load();

        // Pages are ordered by creation, which says nothing about later
        // edits, so the whole list is read and unchanged days are skipped
        // by fingerprint below.
        self.set_phase(SyncPhase::Fetching);
        info!(?mode, "fetching daily records");
        let records = match self.ctx.source.fetch(None).await {
            Ok(records) => records,
            Err(err) => return SyncOutcome::Failed(err),
        };
        if self.shutdown.is_cancelled() {
            return SyncOutcome::Cancelled;
        }

        self.set_phase(SyncPhase::Merging);
        let mut report = SyncReport {
            fetched: records.len(),
            ..SyncReport::default()
        };
        let max_updated = records.iter().map(|r| r.updated_ts).max();
        if let Some(watermark) = state.last_synced_ts {
            let changed = records.iter().filter(|r| r.updated_ts > watermark).count();
            debug!(watermark, changed, "records updated since last sync");
        }

        let mut by_date: BTreeMap<Date, Vec<DailyRecord>> = BTreeMap::new();
        for record in records {
            match self.local_date(record.created_ts) {
                Some(date) => by_date.entry(date).or_default().push(record),
                None => warn!(id = %record.id, ts = record.created_ts, "record timestamp out of range"),
            }
        }
        // Days rendered before may have lost every record since.
        for date in state.fingerprints.keys().filter_map(|k| parse_date_key(k)) {
            by_date.entry(date).or_default();
        }

        let header = settings.daily_record_header.as_str();
        let mut clean = true;
        let mut cancelled = false;
        for (date, day_records) in by_date {
            let path = match self.merger.note_path(date) {
                Ok(path) => path,
                Err(err) => {
                    report.failures += 1;
                    clean = false;
                    self.report_failure(&err);
                    continue;
                }
            };
            let key = date_key(date);
            let fingerprint = section_fingerprint(&path, header, &self.merger.lines_for(&day_records));
            if mode == SyncMode::Normal && state.fingerprints.get(&key) == Some(&fingerprint) {
                report.notes_skipped += 1;
                continue;
            }
            if self.shutdown.is_cancelled() {
                cancelled = true;
                break;
            }

            match self.merger.merge(date, &day_records, header).await {
                Ok(MergeOutcome::Cancelled { .. }) => {
                    cancelled = true;
                    break;
                }
                Ok(outcome) => {
                    if matches!(outcome, MergeOutcome::Updated { .. }) {
                        report.notes_updated += 1;
                    } else {
                        report.notes_unchanged += 1;
                    }
                    // A day left without records has had its section emptied
                    // and needs no further tracking.
                    if day_records.is_empty() {
                        state.fingerprints.remove(&key);
                    } else {
                        state.fingerprints.insert(key, fingerprint);
                    }
                }
                Err(err) if err.is_soft() => {
                    report.notes_missing += 1;
                    state.fingerprints.remove(&key);
                    self.report_missing(&err);
                }
                Err(err) => {
                    report.failures += 1;
                    clean = false;
                    self.report_failure(&err);
                }
            }
        }

        // A replacement orchestrator may own the state file by now.
        if cancelled {
            return SyncOutcome::Cancelled;
        }

        if clean {
            state.last_synced_ts = match (state.last_synced_ts, max_updated) {
                (Some(prev), Some(seen)) => Some(prev.max(seen)),
                (prev, seen) => seen.or(prev),
            };
        }
        if let Err(err) = self.ctx.state.save(state) {
            warn!("failed to persist sync state: {err}");
        }
        SyncOutcome::Completed(report)
    }

    fn report_missing(&self, err: &SyncError) {
        let SyncError::NoteNotFound(path) = err else {
            return;
        };
        if self.ctx.settings.daily_record_warning {
            warn!(path, "daily note missing");
            let text = i18n::text(self.ctx.locale, Message::NoDailyNote);
            self.ctx
                .notifier
                .notice(NoticeLevel::Warn, &format!("{text}: {path}"));
        } else {
            debug!(path, "daily note missing, skipped");
        }
    }

    fn report_failure(&self, err: &SyncError) {
        error!("daily record sync failed: {err}");
        let message = match err {
            SyncError::Config(_) if !self.ctx.settings.has_remote() => {
                i18n::text(self.ctx.locale, Message::MissingConfig).to_string()
            }
            other => format!("{}: {other}", i18n::text(self.ctx.locale, Message::SyncFailed)),
        };
        self.ctx.notifier.notice(NoticeLevel::Error, &message);
    }
}

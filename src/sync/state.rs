use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SyncResult;
use crate::io_atomic;
use crate::settings::PluginSettings;
use crate::utils::sha256_hex;

/// What the last syncs left behind. Tied to one API + token pair; a
/// different account starts from scratch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncState {
    pub account: String,
    /// Highest `updated_ts` seen by the last fully successful sync.
    pub last_synced_ts: Option<i64>,
    /// `YYYY-MM-DD` -> digest of the section last written for that day.
    pub fingerprints: BTreeMap<String, String>,
}

pub fn account_key(settings: &PluginSettings) -> String {
    sha256_hex(
        format!(
            "{}\n{}",
            settings.daily_record_api.trim(),
            settings.daily_record_token.trim()
        )
        .as_bytes(),
    )
}

/// Digest of everything that decides a section's text.
pub fn section_fingerprint(path: &str, header: &str, lines: &[String]) -> String {
    let mut buf = String::new();
    buf.push_str(path);
    buf.push('\0');
    buf.push_str(header);
    buf.push('\0');
    buf.push_str(&lines.join("\n"));
    sha256_hex(buf.as_bytes())
}

/// Sync state kept in memory and, when a path is given, mirrored to disk.
pub struct SyncStateStore {
    path: Option<PathBuf>,
    account: String,
    current: Mutex<SyncState>,
}

impl SyncStateStore {
    pub fn open(path: Option<PathBuf>, settings: &PluginSettings) -> Self {
        let account = account_key(settings);
        let loaded = path
            .as_ref()
            .and_then(|p| std::fs::read(p).ok())
            .and_then(|bytes| match serde_json::from_slice::<SyncState>(&bytes) {
                Ok(state) => Some(state),
                Err(err) => {
                    warn!("ignoring unreadable sync state: {err}");
                    None
                }
            })
            .filter(|state| state.account == account);

        let current = loaded.unwrap_or_else(|| {
            debug!("starting with empty sync state");
            SyncState {
                account: account.clone(),
                ..SyncState::default()
            }
        });

        Self {
            path,
            account,
            current: Mutex::new(current),
        }
    }

    pub fn in_memory(settings: &PluginSettings) -> Self {
        Self::open(None, settings)
    }

    pub fn load(&self) -> SyncState {
        self.current
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn save(&self, mut state: SyncState) -> SyncResult<()> {
        state.account = self.account.clone();
        if let Some(path) = &self.path {
            let bytes = serde_json::to_vec_pretty(&state)?;
            io_atomic::write_atomic(path, &bytes)?;
        }
        *self.current.lock().unwrap_or_else(|p| p.into_inner()) = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(token: &str) -> PluginSettings {
        PluginSettings {
            daily_record_api: "https://memos.example.com/api/memo".to_string(),
            daily_record_token: token.to_string(),
            ..PluginSettings::default()
        }
    }

    #[test]
    fn persists_and_resets_on_account_change() {
        let dir = std::env::temp_dir().join(format!("pp-state-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("sync-state.json");

        let store = SyncStateStore::open(Some(path.clone()), &settings("a"));
        let mut state = store.load();
        state.last_synced_ts = Some(42);
        state.fingerprints.insert("2024-01-02".to_string(), "abc".to_string());
        store.save(state).expect("save");

        let reopened = SyncStateStore::open(Some(path.clone()), &settings("a"));
        assert_eq!(reopened.load().last_synced_ts, Some(42));

        let other = SyncStateStore::open(Some(path), &settings("b"));
        assert_eq!(other.load().last_synced_ts, None);
        assert!(other.load().fingerprints.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn fingerprint_depends_on_header_and_path() {
        let lines = vec!["- 08:00 a".to_string()];
        let base = section_fingerprint("Daily/a.md", "Daily Record", &lines);
        assert_ne!(base, section_fingerprint("Daily/b.md", "Daily Record", &lines));
        assert_ne!(base, section_fingerprint("Daily/a.md", "Memos", &lines));
        assert_eq!(base, section_fingerprint("Daily/a.md", "Daily Record", &lines));
    }
}

use serde::{Deserialize, Serialize};
use time::Weekday;

use crate::error::{SyncError, SyncResult};

pub const DEFAULT_DAILY_NOTE_PATH: &str = "Daily/{date}.md";
pub const DEFAULT_DAILY_RECORD_HEADER: &str = "Daily Record";
pub const WEEK_START_AUTO: i8 = -1;

/// Persisted plugin configuration. Key names match the `data.json` written
/// by the note app, absent keys fall back to [`PluginSettings::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    #[serde(rename = "dailyNotePath")]
    pub daily_note_path: String,
    #[serde(rename = "dailyRecordHeader")]
    pub daily_record_header: String,
    #[serde(rename = "dailyRecordAPI")]
    pub daily_record_api: String,
    #[serde(rename = "dailyRecordToken")]
    pub daily_record_token: String,
    #[serde(rename = "dailyRecordWarning")]
    pub daily_record_warning: bool,
    #[serde(rename = "weekStart")]
    pub week_start: i8,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            daily_note_path: DEFAULT_DAILY_NOTE_PATH.to_string(),
            daily_record_header: DEFAULT_DAILY_RECORD_HEADER.to_string(),
            daily_record_api: String::new(),
            daily_record_token: String::new(),
            daily_record_warning: true,
            week_start: WEEK_START_AUTO,
        }
    }
}

impl PluginSettings {
    /// First day of the week; `-1` (auto) resolves to Monday.
    pub fn week_start_day(&self) -> Weekday {
        match self.week_start {
            0 => Weekday::Sunday,
            1 => Weekday::Monday,
            2 => Weekday::Tuesday,
            3 => Weekday::Wednesday,
            4 => Weekday::Thursday,
            5 => Weekday::Friday,
            6 => Weekday::Saturday,
            _ => Weekday::Monday,
        }
    }

    pub fn validate(&self) -> SyncResult<()> {
        if !(WEEK_START_AUTO..=6).contains(&self.week_start) {
            return Err(SyncError::Config(format!(
                "weekStart must be -1 or 0-6, got {}",
                self.week_start
            )));
        }
        if self.daily_note_path.trim().is_empty() {
            return Err(SyncError::Config("dailyNotePath is empty".to_string()));
        }
        if self.daily_record_header.trim().trim_start_matches('#').trim().is_empty() {
            return Err(SyncError::Config("dailyRecordHeader is empty".to_string()));
        }
        Ok(())
    }

    /// True when both remote settings are present. Sync refuses to touch the
    /// network otherwise.
    pub fn has_remote(&self) -> bool {
        !self.daily_record_api.trim().is_empty() && !self.daily_record_token.trim().is_empty()
    }

    /// Returns a copy with one key replaced, for `config set`.
    pub fn with_value(&self, key: &str, value: &str) -> SyncResult<Self> {
        let mut next = self.clone();
        match key {
            "dailyNotePath" => next.daily_note_path = value.to_string(),
            "dailyRecordHeader" => next.daily_record_header = value.to_string(),
            "dailyRecordAPI" => next.daily_record_api = value.trim().to_string(),
            "dailyRecordToken" => next.daily_record_token = value.trim().to_string(),
            "dailyRecordWarning" => {
                next.daily_record_warning = value.trim().parse::<bool>().map_err(|_| {
                    SyncError::Config(format!("dailyRecordWarning expects true/false, got {value}"))
                })?
            }
            "weekStart" => {
                next.week_start = value.trim().parse::<i8>().map_err(|_| {
                    SyncError::Config(format!("weekStart expects an integer, got {value}"))
                })?
            }
            other => return Err(SyncError::Config(format!("unknown setting: {other}"))),
        }
        next.validate()?;
        Ok(next)
    }
}

mod store;
mod types;

pub use store::{apply_env_overrides, default_settings_path, load_env_files, SettingsStore};
pub use types::{PluginSettings, DEFAULT_DAILY_RECORD_HEADER, WEEK_START_AUTO};

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

/// Non-blocking user-facing notices, the daemon's stand-in for the host's
/// toast messages.
pub trait Notifier: Send + Sync {
    fn notice(&self, level: NoticeLevel, message: &str);
}

/// Writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notice(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => info!(target: "notice", "{message}"),
            NoticeLevel::Warn => warn!(target: "notice", "{message}"),
            NoticeLevel::Error => error!(target: "notice", "{message}"),
        }
    }
}

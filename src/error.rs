use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("authorization failed ({code}): {message}")]
    Auth { code: u16, message: String },

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("daily note not found: {0}")]
    NoteNotFound(String),

    #[error("no view provided")]
    NoViewProvided,

    #[error("view does not exist: {0}")]
    UnknownView(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Soft failures are reported to the user but never abort a sync.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::NoteNotFound(_))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

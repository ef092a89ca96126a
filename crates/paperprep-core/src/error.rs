use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Document unreadable: {path}: {reason}")]
    DocumentUnreadable { path: PathBuf, reason: String },

    #[error("Invalid chunk configuration: {0}")]
    InvalidChunkConfig(String),

    #[error("Inference unavailable: {0}")]
    InferenceUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Timed out after {after:?}: {path}")]
    TimedOut { path: PathBuf, after: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::DocumentUnreadable { path: path.into(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

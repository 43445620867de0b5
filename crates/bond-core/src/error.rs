//! Error types shared across the bond crate

use std::path::PathBuf;

/// Result alias used by every fallible operation in this crate
pub type Result<T> = std::result::Result<T, BondError>;

#[derive(Debug, thiserror::Error)]
pub enum BondError {
    /// The backing file or its directory could not be read or written
    #[error("storage unavailable at {}: {source}", .path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisted content is not a valid bond document
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode bond state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    /// The user interrupted the session (Ctrl-C)
    #[error("session interrupted")]
    Interrupted,

    /// Any other failure while handling a single turn
    #[error("turn failed: {0}")]
    Turn(String),
}

impl BondError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            source,
        }
    }
}

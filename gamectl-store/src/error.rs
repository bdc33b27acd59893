//! Error types for gamectl-store.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport or store failure while reading the record.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Transport or store failure while inserting or updating the record.
    #[error("write failed: {0}")]
    Write(String),

    /// The point query returned zero rows. Recoverable — the synchronizer
    /// absorbs this by creating the record.
    #[error("no game state record exists yet")]
    NotFound,

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON protocol encode/decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed or unexpected wire traffic.
    #[error("store protocol error: {0}")]
    Protocol(String),

    /// The store daemon is not reachable at its socket.
    #[error("store daemon is not running (socket missing: {socket})")]
    DaemonNotRunning { socket: PathBuf },
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

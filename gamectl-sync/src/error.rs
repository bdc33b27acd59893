//! Error types for gamectl-sync.

use thiserror::Error;

use gamectl_store::StoreError;

/// All errors that can arise from synchronizer operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A write is already outstanding; the client allows at most one.
    #[error("a write is already in flight")]
    Busy,

    /// The view holds no record yet; load first.
    #[error("game state is not loaded")]
    NotReady,
}

//! The generic store seam.
//!
//! Everything above this trait (synchronizer, CLI) is transport-agnostic:
//! the daemon-backed [`SocketStore`](crate::socket::SocketStore) and the
//! in-memory [`MemoryStore`](crate::memory::MemoryStore) are
//! interchangeable.

use async_trait::async_trait;
use tokio::sync::mpsc;

use gamectl_core::{GameState, RecordId, WriteSet};

use crate::error::StoreError;

/// Buffer for a single subscription feed. A subscriber that falls this
/// far behind is disconnected rather than queued indefinitely.
pub const FEED_BUFFER: usize = 32;

/// Remote store holding the singleton game-state row.
#[async_trait]
pub trait GlobalsStore {
    /// Point query for the singleton row.
    ///
    /// `Err(StoreError::NotFound)` when the table is empty — recoverable,
    /// the caller is expected to create the row.
    async fn fetch(&self) -> Result<GameState, StoreError>;

    /// Create the row with every flag false; the store assigns the id.
    ///
    /// First writer wins: if a concurrent creator already inserted the
    /// row, the existing image is returned unchanged.
    async fn insert_default(&self) -> Result<GameState, StoreError>;

    /// Atomic partial update keyed by the row id. Returns the post-update
    /// row image; `Err(StoreError::Write)` when no row with that id exists.
    async fn update(&self, id: RecordId, set: &WriteSet) -> Result<GameState, StoreError>;

    /// Long-lived feed of post-update row images. Dropping the returned
    /// [`ChangeFeed`] releases the subscription.
    async fn subscribe(&self) -> Result<ChangeFeed, StoreError>;
}

/// Handle on a change-notification subscription.
///
/// Yields each post-update row image in arrival order; `None` once the
/// store side has gone away. Dropping the feed tears the subscription
/// down.
#[derive(Debug)]
pub struct ChangeFeed {
    rx: mpsc::Receiver<GameState>,
}

impl ChangeFeed {
    pub(crate) fn new(rx: mpsc::Receiver<GameState>) -> Self {
        Self { rx }
    }

    /// Next pushed row image, or `None` when the feed has ended.
    pub async fn next(&mut self) -> Option<GameState> {
        self.rx.recv().await
    }
}

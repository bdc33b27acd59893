//! In-memory store — test double and embedded backend.
//!
//! Mirrors the daemon's semantics exactly: first-writer-wins insert,
//! read-modify-write update under a write lock, broadcast fan-out of
//! post-update row images.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, RwLock};

use gamectl_core::{GameState, RecordId, WriteSet};

use crate::error::StoreError;
use crate::store::{ChangeFeed, GlobalsStore, FEED_BUFFER};

#[derive(Debug)]
struct Inner {
    row: RwLock<Option<GameState>>,
    changes: broadcast::Sender<GameState>,
}

/// Shared in-memory singleton-row store.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(FEED_BUFFER);
        Self {
            inner: Arc::new(Inner {
                row: RwLock::new(None),
                changes,
            }),
        }
    }

    /// Seed the store with an existing row (test setup).
    pub async fn seed(&self, record: GameState) {
        let mut row = self.inner.row.write().await;
        *row = Some(record);
    }

    /// Number of live subscription feeds.
    pub fn subscriber_count(&self) -> usize {
        self.inner.changes.receiver_count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GlobalsStore for MemoryStore {
    async fn fetch(&self) -> Result<GameState, StoreError> {
        let row = self.inner.row.read().await;
        (*row).ok_or(StoreError::NotFound)
    }

    async fn insert_default(&self) -> Result<GameState, StoreError> {
        let mut row = self.inner.row.write().await;
        if let Some(existing) = *row {
            return Ok(existing);
        }
        let created = GameState::new(RecordId(1));
        *row = Some(created);
        Ok(created)
    }

    async fn update(&self, id: RecordId, set: &WriteSet) -> Result<GameState, StoreError> {
        let mut row = self.inner.row.write().await;
        let Some(current) = *row else {
            return Err(StoreError::Write(format!("no record with id {id}")));
        };
        if current.id != id {
            return Err(StoreError::Write(format!("no record with id {id}")));
        }
        let updated = set.apply(&current);
        *row = Some(updated);
        // Subscribers may be absent; fan-out failure is not a write failure.
        let _ = self.inner.changes.send(updated);
        Ok(updated)
    }

    async fn subscribe(&self) -> Result<ChangeFeed, StoreError> {
        let mut changes = self.inner.changes.subscribe();
        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(record) => {
                        if tx.send(record).await.is_err() {
                            break; // feed dropped
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber lagged, dropping feed");
                        break;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(ChangeFeed::new(rx))
    }
}

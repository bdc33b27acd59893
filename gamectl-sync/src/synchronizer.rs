//! State synchronizer — the client-side owner of the cached record.
//!
//! ## Consistency contract
//!
//! The remote store is the sole source of truth. The synchronizer never
//! applies a write locally before the store confirms it: on success it
//! adopts the store's post-update row image, on failure it re-reads the
//! row (compensating re-read, not retry-the-write — the write's exact
//! failure point is unknown). Pushed row images always overwrite the
//! local copy, last writer wins.

use gamectl_core::policy::{reset_write_set, write_set_for, ResetScope};
use gamectl_core::{Flag, GameState};
use gamectl_store::{GlobalsStore, StoreError};

use crate::error::SyncError;
use crate::view::{Notification, ViewState};

/// Owns the cached singleton record and every path that mutates it.
#[derive(Debug)]
pub struct Synchronizer<S: GlobalsStore> {
    store: S,
    view: ViewState,
    updating: bool,
    notifications: Vec<Notification>,
}

impl<S: GlobalsStore> Synchronizer<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            view: ViewState::Loading,
            updating: false,
            notifications: Vec::new(),
        }
    }

    /// Fetch the singleton record, creating it if the table is empty.
    ///
    /// A missing row is absorbed: the synchronizer inserts the default
    /// record and lands in `Ready` without surfacing an error. Fetch or
    /// creation failures leave the view in `Error` (recoverable by
    /// calling `load` again).
    pub async fn load(&mut self) -> Result<GameState, SyncError> {
        self.view = ViewState::Loading;
        match self.store.fetch().await {
            Ok(record) => {
                tracing::debug!("loaded record id={}", record.id);
                self.view = ViewState::Ready(record);
                Ok(record)
            }
            Err(StoreError::NotFound) => {
                self.view = ViewState::Empty;
                self.create_default().await
            }
            Err(err) => {
                tracing::warn!("load failed: {err}");
                self.view = ViewState::Error("failed to load game state".to_string());
                Err(err.into())
            }
        }
    }

    async fn create_default(&mut self) -> Result<GameState, SyncError> {
        match self.store.insert_default().await {
            Ok(created) => {
                tracing::info!("initialized game state record id={}", created.id);
                self.view = ViewState::Ready(created);
                self.notify_success("game state initialized");
                Ok(created)
            }
            Err(err) => {
                tracing::warn!("initialization failed: {err}");
                self.view = ViewState::Error("failed to initialize game state".to_string());
                Err(err.into())
            }
        }
    }

    /// Set one flag, cascading dependent flags through the policy engine.
    ///
    /// At most one write may be outstanding per client; a second request
    /// is rejected with [`SyncError::Busy`], never queued.
    pub async fn request_change(
        &mut self,
        flag: Flag,
        value: bool,
    ) -> Result<GameState, SyncError> {
        let set = write_set_for(flag, value);
        self.send_write_set(set, "game state updated", "failed to update game state")
            .await
    }

    /// Zero the checkpoint flags (and, for [`ResetScope::Full`], the
    /// started flag) in a single write.
    pub async fn reset(&mut self, scope: ResetScope) -> Result<GameState, SyncError> {
        let set = reset_write_set(scope);
        self.send_write_set(set, "all checkpoints have been reset", "failed to reset checkpoints")
            .await
    }

    async fn send_write_set(
        &mut self,
        set: gamectl_core::WriteSet,
        success: &str,
        failure: &str,
    ) -> Result<GameState, SyncError> {
        if self.updating {
            return Err(SyncError::Busy);
        }
        let Some(record) = self.view.record().copied() else {
            return Err(SyncError::NotReady);
        };

        self.updating = true;
        let result = self.store.update(record.id, &set).await;
        self.updating = false;

        match result {
            Ok(updated) => {
                self.view = ViewState::Ready(updated);
                self.notify_success(success);
                Ok(updated)
            }
            Err(err) => {
                tracing::warn!("write failed, resynchronizing: {err}");
                self.notify_failure(failure);
                // Compensating re-read: the record on display stays as it
                // was until this completes and overwrites it.
                let _ = self.load().await;
                Err(err.into())
            }
        }
    }

    /// Merge a pushed row image. Unconditional overwrite — no client-side
    /// conflict detection, the store's last write wins.
    pub fn apply_remote(&mut self, record: GameState) {
        tracing::debug!("remote update for record id={}", record.id);
        self.view = ViewState::Ready(record);
    }

    /// Open a change feed on the underlying store.
    pub async fn subscribe(&self) -> Result<gamectl_store::ChangeFeed, SyncError> {
        Ok(self.store.subscribe().await?)
    }

    pub fn state(&self) -> &ViewState {
        &self.view
    }

    pub fn record(&self) -> Option<&GameState> {
        self.view.record()
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    /// Drain accumulated operator notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn notify_success(&mut self, message: &str) {
        self.notifications
            .push(Notification::Success(message.to_string()));
    }

    fn notify_failure(&mut self, message: &str) {
        self.notifications
            .push(Notification::Failure(message.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use gamectl_store::MemoryStore;

    #[tokio::test]
    async fn load_auto_creates_on_empty_store() {
        let mut sync = Synchronizer::new(MemoryStore::new());
        let record = sync.load().await.expect("load");

        assert!(!record.game_has_started);
        assert!(matches!(sync.state(), ViewState::Ready(_)));
        assert_eq!(
            sync.take_notifications(),
            vec![Notification::Success("game state initialized".to_string())]
        );
    }

    #[tokio::test]
    async fn starting_the_game_touches_only_the_started_flag() {
        let mut sync = Synchronizer::new(MemoryStore::new());
        sync.load().await.expect("load");

        let updated = sync
            .request_change(Flag::GameStarted, true)
            .await
            .expect("start");
        assert!(updated.game_has_started);
        assert!(!updated.checkpoint1_has_completed);
    }

    #[tokio::test]
    async fn undo_cascades_through_the_store() {
        let store = MemoryStore::new();
        let mut sync = Synchronizer::new(store.clone());
        sync.load().await.expect("load");
        sync.request_change(Flag::GameStarted, true).await.expect("start");
        sync.request_change(Flag::Checkpoint1, true).await.expect("cp1");
        sync.request_change(Flag::Checkpoint2, true).await.expect("cp2");

        let after = sync
            .request_change(Flag::Checkpoint1, false)
            .await
            .expect("undo cp1");
        assert!(after.game_has_started);
        assert!(!after.checkpoint1_has_completed);
        assert!(!after.checkpoint2_has_completed);

        // The store agrees — this was one atomic write-set.
        let remote = store.fetch().await.expect("fetch");
        assert_eq!(remote, after);
    }

    #[tokio::test]
    async fn change_before_load_is_rejected() {
        let mut sync = Synchronizer::new(MemoryStore::new());
        let err = sync
            .request_change(Flag::GameStarted, true)
            .await
            .expect_err("no record yet");
        assert!(matches!(err, SyncError::NotReady));
    }

    #[tokio::test]
    async fn remote_push_overwrites_local_state() {
        let store = MemoryStore::new();
        let mut sync = Synchronizer::new(store.clone());
        let local = sync.load().await.expect("load");

        let mut pushed = local;
        pushed.game_has_started = true;
        pushed.checkpoint1_has_completed = true;
        sync.apply_remote(pushed);

        assert_eq!(sync.record(), Some(&pushed));
    }

    #[tokio::test]
    async fn remote_push_resolves_a_stale_error_view() {
        let store = MemoryStore::new();
        let record = store.insert_default().await.expect("insert");
        let mut sync = Synchronizer::new(store);
        // Never loaded; simulate a push arriving first.
        sync.apply_remote(record);
        assert!(matches!(sync.state(), ViewState::Ready(_)));
    }

    #[tokio::test]
    async fn reset_full_clears_started_flag_too() {
        let mut sync = Synchronizer::new(MemoryStore::new());
        sync.load().await.expect("load");
        sync.request_change(Flag::GameStarted, true).await.expect("start");
        sync.request_change(Flag::Checkpoint1, true).await.expect("cp1");
        sync.take_notifications();

        let after = sync.reset(ResetScope::Full).await.expect("reset");
        assert!(!after.game_has_started);
        assert!(!after.checkpoint1_has_completed);
        assert_eq!(
            sync.take_notifications(),
            vec![Notification::Success(
                "all checkpoints have been reset".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn reset_checkpoints_keeps_the_game_running() {
        let mut sync = Synchronizer::new(MemoryStore::new());
        sync.load().await.expect("load");
        sync.request_change(Flag::GameStarted, true).await.expect("start");
        sync.request_change(Flag::Checkpoint1, true).await.expect("cp1");

        let after = sync.reset(ResetScope::Checkpoints).await.expect("reset");
        assert!(after.game_has_started);
        assert!(!after.checkpoint1_has_completed);
    }
}

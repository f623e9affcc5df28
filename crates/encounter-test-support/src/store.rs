//! Test stores: mock `QuestStore` implementations for tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use encounter_core::error::DomainError;
use encounter_core::ids::PlayerId;
use encounter_core::store::{QuestStore, StoredRecord};

/// An in-memory store that keeps the latest document per player and counts
/// saves.
#[derive(Debug, Default)]
pub struct MemoryQuestStore {
    records: Mutex<BTreeMap<PlayerId, StoredRecord>>,
    saves: Mutex<usize>,
}

impl MemoryQuestStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored document for `player_id`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn record(&self, player_id: PlayerId) -> Option<StoredRecord> {
        self.records.lock().unwrap().get(&player_id).cloned()
    }

    /// Seeds a document directly, bypassing the save counter.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn insert(&self, record: StoredRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.player_id, record);
    }

    /// Number of successful `save` calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl QuestStore for MemoryQuestStore {
    async fn load(&self, player_id: PlayerId) -> Result<Option<StoredRecord>, DomainError> {
        Ok(self.records.lock().unwrap().get(&player_id).cloned())
    }

    async fn save(&self, record: StoredRecord) -> Result<(), DomainError> {
        self.records
            .lock()
            .unwrap()
            .insert(record.player_id, record);
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }

    async fn list_players(&self) -> Result<Vec<PlayerId>, DomainError> {
        Ok(self.records.lock().unwrap().keys().copied().collect())
    }
}

/// A store that always returns an infrastructure error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingQuestStore;

#[async_trait]
impl QuestStore for FailingQuestStore {
    async fn load(&self, _player_id: PlayerId) -> Result<Option<StoredRecord>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn save(&self, _record: StoredRecord) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn list_players(&self) -> Result<Vec<PlayerId>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// Wraps a [`MemoryQuestStore`] and yields to the runtime after every read,
/// so concurrent handlers interleave between loading and saving.
#[derive(Debug)]
pub struct YieldingQuestStore {
    inner: Arc<MemoryQuestStore>,
}

impl YieldingQuestStore {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<MemoryQuestStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl QuestStore for YieldingQuestStore {
    async fn load(&self, player_id: PlayerId) -> Result<Option<StoredRecord>, DomainError> {
        let loaded = self.inner.load(player_id).await;
        tokio::task::yield_now().await;
        loaded
    }

    async fn save(&self, record: StoredRecord) -> Result<(), DomainError> {
        self.inner.save(record).await
    }

    async fn list_players(&self) -> Result<Vec<PlayerId>, DomainError> {
        let players = self.inner.list_players().await;
        tokio::task::yield_now().await;
        players
    }
}

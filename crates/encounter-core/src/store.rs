//! Persistence collaborator abstraction.
//!
//! The store is an opaque per-player key-value document. It is not
//! transactional: callers re-load immediately before every mutation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::PlayerId;

/// Stored representation of a player's quest document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// The player the document belongs to.
    pub player_id: PlayerId,
    /// Serialized document payload.
    pub payload: serde_json::Value,
    /// Timestamp of the last save.
    pub saved_at: DateTime<Utc>,
}

/// Store trait for loading and saving per-player quest documents.
#[async_trait]
pub trait QuestStore: Send + Sync {
    /// Load the player's document, or `None` if nothing was ever saved.
    async fn load(&self, player_id: PlayerId) -> Result<Option<StoredRecord>, DomainError>;

    /// Replace the player's document.
    async fn save(&self, record: StoredRecord) -> Result<(), DomainError>;

    /// Every player with a saved document.
    async fn list_players(&self) -> Result<Vec<PlayerId>, DomainError>;
}

//! The per-player quest document.
//!
//! A player holds at most one active encounter. Abandoned instances go back
//! to the player's available pool, from which they can be accepted again.

use chrono::{DateTime, Utc};
use encounter_core::error::DomainError;
use encounter_core::ids::{PlayerId, QuestId};
use encounter_core::store::StoredRecord;
use serde::{Deserialize, Serialize};

use super::aggregates::EncounterInstance;

/// Everything persisted for one player.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestRecord {
    /// The single active encounter slot.
    #[serde(default)]
    pub active: Option<EncounterInstance>,
    /// Abandoned instances that can be accepted again.
    #[serde(default)]
    pub available: Vec<EncounterInstance>,
}

impl QuestRecord {
    /// Decodes a stored document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload is not a quest
    /// document.
    pub fn from_stored(stored: &StoredRecord) -> Result<Self, DomainError> {
        serde_json::from_value(stored.payload.clone())
            .map_err(|e| DomainError::Infrastructure(format!("quest record decoding failed: {e}")))
    }

    /// Encodes the document for the store.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if serialization fails.
    pub fn to_stored(
        &self,
        player_id: PlayerId,
        saved_at: DateTime<Utc>,
    ) -> Result<StoredRecord, DomainError> {
        let payload = serde_json::to_value(self)
            .map_err(|e| DomainError::Infrastructure(format!("quest record encoding: {e}")))?;
        Ok(StoredRecord {
            player_id,
            payload,
            saved_at,
        })
    }

    /// The active instance if it has the given id.
    #[must_use]
    pub fn active_with_id(&self, quest_id: QuestId) -> Option<&EncounterInstance> {
        self.active.as_ref().filter(|active| active.id == quest_id)
    }

    /// Removes a pooled instance for re-acceptance.
    pub fn take_available(&mut self, quest_id: QuestId) -> Option<EncounterInstance> {
        let index = self.available.iter().position(|p| p.id == quest_id)?;
        Some(self.available.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use encounter_core::encounter::{Composition, Tier, UnitGroup};
    use encounter_core::geometry::Position;
    use encounter_core::ids::DimensionId;
    use encounter_test_support::FixedClock;
    use encounter_world::domain::zone::Zone;
    use uuid::Uuid;

    use super::*;

    fn instance(player_id: PlayerId) -> EncounterInstance {
        EncounterInstance::accept(
            QuestId::new(),
            player_id,
            None,
            Tier::Rare,
            Composition(vec![UnitGroup::new("zombie", 3)]),
            Zone {
                center: Position::new(150.0, 64.0, -280.0),
                inner_radius: 60.0,
                outer_radius: 120.0,
            },
            false,
            DimensionId::new("overworld"),
            Uuid::new_v4(),
            &FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_stored_document_round_trip_keeps_slot_and_pool() {
        // Arrange
        let player = PlayerId::new();
        let active = instance(player);
        let pooled = instance(player);
        let record = QuestRecord {
            active: Some(active.clone()),
            available: vec![pooled.clone()],
        };
        let saved_at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();

        // Act
        let stored = record.to_stored(player, saved_at).unwrap();
        let decoded = QuestRecord::from_stored(&stored).unwrap();

        // Assert
        assert_eq!(stored.player_id, player);
        assert_eq!(decoded.active.map(|i| i.id), Some(active.id));
        assert_eq!(decoded.available.len(), 1);
        assert_eq!(decoded.available[0].id, pooled.id);
    }

    #[test]
    fn test_from_stored_rejects_foreign_payload() {
        let stored = StoredRecord {
            player_id: PlayerId::new(),
            payload: serde_json::json!({ "active": 42 }),
            saved_at: Utc::now(),
        };

        assert!(matches!(
            QuestRecord::from_stored(&stored),
            Err(DomainError::Infrastructure(_))
        ));
    }

    #[test]
    fn test_take_available_removes_only_matching_entry() {
        let player = PlayerId::new();
        let first = instance(player);
        let second = instance(player);
        let mut record = QuestRecord {
            active: None,
            available: vec![first.clone(), second.clone()],
        };

        let taken = record.take_available(second.id).unwrap();

        assert_eq!(taken.id, second.id);
        assert_eq!(record.available.len(), 1);
        assert!(record.take_available(second.id).is_none());
    }
}

//! Domain events for encounter instances.

use encounter_core::encounter::Tier;
use encounter_core::event::{DomainEvent, EventMetadata};
use encounter_core::geometry::Position;
use encounter_core::ids::{ObjectId, PlayerId};
use serde::{Deserialize, Serialize};

/// Emitted when a player accepts a contract and a zone is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterAccepted {
    /// The accepting player.
    pub player_id: PlayerId,
    /// Tier of the contract.
    pub tier: Tier,
    /// Centre of the assigned zone.
    pub zone_center: Position,
    /// Whether the zone is the tier's backup location.
    pub backup_location: bool,
    /// Counted units required.
    pub total_unit_count: u32,
}

/// Emitted when the player enters the trigger radius and the spawn sequence
/// is scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnStarted {
    /// Where the player stood when the trigger fired.
    pub player_position: Position,
}

/// Emitted when the group has been created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSpawned {
    /// Where the group was placed.
    pub location: Position,
    /// Objects created immediately.
    pub object_ids: Vec<ObjectId>,
}

/// Emitted when a counted unit dies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDefeated {
    /// The dead object.
    pub object_id: ObjectId,
    /// Progress after this kill.
    pub progress: u32,
}

/// Emitted when progress reaches the required total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterCompleted {
    /// Whether completion was forced administratively.
    pub forced: bool,
}

/// Emitted when a completed contract is handed to the reward collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterTurnedIn {
    /// Objects removed during turn-in.
    pub removed: usize,
    /// Payout summary.
    pub payout: String,
}

/// Emitted when the player abandons the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterAbandoned {
    /// Objects removed.
    pub removed: usize,
}

/// Emitted when the owning player disconnects with a spawned group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSuspended {
    /// Objects removed.
    pub removed: usize,
}

/// Emitted when a suspended group is recreated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterRestored {
    /// Objects recreated immediately.
    pub object_ids: Vec<ObjectId>,
}

/// Emitted when objects from a deferred creation join the spawn record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectsAttached {
    /// The late objects.
    pub object_ids: Vec<ObjectId>,
}

/// Event payload variants for encounter instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EncounterEventKind {
    /// A contract was accepted.
    Accepted(EncounterAccepted),
    /// The spawn sequence was scheduled.
    SpawnStarted(SpawnStarted),
    /// The group was created.
    Spawned(EncounterSpawned),
    /// A counted unit died.
    UnitDefeated(UnitDefeated),
    /// Every counted unit is defeated.
    Completed(EncounterCompleted),
    /// The contract was turned in.
    TurnedIn(EncounterTurnedIn),
    /// The contract was abandoned.
    Abandoned(EncounterAbandoned),
    /// The group was removed because its player left.
    Suspended(EncounterSuspended),
    /// The group was recreated on reconnect.
    Restored(EncounterRestored),
    /// Late objects joined the spawn record.
    ObjectsAttached(ObjectsAttached),
}

impl EncounterEventKind {
    /// Type name for routing.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            EncounterEventKind::Accepted(_) => "encounter.accepted",
            EncounterEventKind::SpawnStarted(_) => "encounter.spawn_started",
            EncounterEventKind::Spawned(_) => "encounter.spawned",
            EncounterEventKind::UnitDefeated(_) => "encounter.unit_defeated",
            EncounterEventKind::Completed(_) => "encounter.completed",
            EncounterEventKind::TurnedIn(_) => "encounter.turned_in",
            EncounterEventKind::Abandoned(_) => "encounter.abandoned",
            EncounterEventKind::Suspended(_) => "encounter.suspended",
            EncounterEventKind::Restored(_) => "encounter.restored",
            EncounterEventKind::ObjectsAttached(_) => "encounter.objects_attached",
        }
    }
}

/// Domain event envelope for encounter instances.
#[derive(Debug, Clone)]
pub struct EncounterEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: EncounterEventKind,
}

impl DomainEvent for EncounterEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(&self.kind).unwrap_or(serde_json::Value::Null)
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

//! Commands for encounter instances.

use encounter_core::command::Command;
use encounter_core::encounter::{Composition, Tier};
use encounter_core::ids::{ObjectId, PlayerId, QuestId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the player is accepting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum EncounterOffer {
    /// A named entry of the configured contract table.
    Contract {
        /// Contract name.
        name: String,
    },
    /// An ad-hoc contract supplied by the quest board.
    Custom {
        /// Tier of the contract.
        tier: Tier,
        /// Units to defeat.
        composition: Composition,
    },
    /// A previously abandoned instance waiting in the player's pool.
    Available {
        /// The pooled instance.
        quest_id: QuestId,
    },
}

/// Command to accept an encounter contract.
#[derive(Debug, Clone)]
pub struct AcceptEncounter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The accepting player.
    pub player_id: PlayerId,
    /// What is being accepted.
    pub offer: EncounterOffer,
}

impl Command for AcceptEncounter {
    fn command_type(&self) -> &'static str {
        "encounter.accept"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target_player(&self) -> Option<PlayerId> {
        Some(self.player_id)
    }
}

/// Command to abandon the player's active encounter.
#[derive(Debug, Clone)]
pub struct AbandonEncounter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The abandoning player.
    pub player_id: PlayerId,
}

impl Command for AbandonEncounter {
    fn command_type(&self) -> &'static str {
        "encounter.abandon"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target_player(&self) -> Option<PlayerId> {
        Some(self.player_id)
    }
}

/// Command to turn in a completed encounter.
#[derive(Debug, Clone)]
pub struct TurnInEncounter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player turning in.
    pub player_id: PlayerId,
}

impl Command for TurnInEncounter {
    fn command_type(&self) -> &'static str {
        "encounter.turn_in"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target_player(&self) -> Option<PlayerId> {
        Some(self.player_id)
    }
}

/// A world object died. Raised for every death, whatever the cause; natural
/// despawns raise nothing.
#[derive(Debug, Clone)]
pub struct RecordObjectDeath {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The dead object.
    pub object_id: ObjectId,
    /// Its unit type.
    pub unit_type: String,
    /// Its tags as last seen by the host.
    pub tags: Vec<String>,
}

impl Command for RecordObjectDeath {
    fn command_type(&self) -> &'static str {
        "encounter.record_object_death"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command raised when a player leaves the world.
#[derive(Debug, Clone)]
pub struct DisconnectPlayer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The departing player.
    pub player_id: PlayerId,
}

impl Command for DisconnectPlayer {
    fn command_type(&self) -> &'static str {
        "encounter.disconnect"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target_player(&self) -> Option<PlayerId> {
        Some(self.player_id)
    }
}

/// Command raised when a player joins the world.
#[derive(Debug, Clone)]
pub struct ReconnectPlayer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The arriving player.
    pub player_id: PlayerId,
}

impl Command for ReconnectPlayer {
    fn command_type(&self) -> &'static str {
        "encounter.reconnect"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target_player(&self) -> Option<PlayerId> {
        Some(self.player_id)
    }
}

/// Administrative command completing the player's spawned encounter.
#[derive(Debug, Clone)]
pub struct ForceComplete {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player whose encounter is completed.
    pub player_id: PlayerId,
}

impl Command for ForceComplete {
    fn command_type(&self) -> &'static str {
        "encounter.force_complete"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target_player(&self) -> Option<PlayerId> {
        Some(self.player_id)
    }
}

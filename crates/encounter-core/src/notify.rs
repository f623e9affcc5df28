//! Player-facing notification triggers.
//!
//! Presentation (sounds, particles, screen text) belongs to the host; this
//! runtime only decides when a notice fires and what it carries.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::encounter::Tier;
use crate::geometry::Position;
use crate::ids::{PlayerId, QuestId};

/// A notice addressed to one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// A contract was accepted and its zone assigned.
    ZoneAssigned {
        /// The accepted instance.
        quest_id: QuestId,
        /// Tier of the instance.
        tier: Tier,
        /// Centre of the assigned zone.
        center: Position,
        /// Whether the zone is a pre-vetted backup location.
        backup_location: bool,
    },
    /// The player is approaching the zone; the group is about to appear.
    Nearing {
        /// The instance being triggered.
        quest_id: QuestId,
    },
    /// The group has been spawned.
    Spawned {
        /// The triggered instance.
        quest_id: QuestId,
        /// Where the group was placed.
        location: Position,
        /// Number of objects created.
        unit_count: usize,
    },
    /// A counted unit was defeated.
    Progress {
        /// The instance.
        quest_id: QuestId,
        /// Units defeated so far.
        progress: u32,
        /// Units required.
        total: u32,
    },
    /// Every counted unit is defeated; the contract can be turned in.
    ReadyToTurnIn {
        /// The completed instance.
        quest_id: QuestId,
    },
    /// The contract was turned in and paid out.
    TurnedIn {
        /// The removed instance.
        quest_id: QuestId,
        /// Payout summary from the reward collaborator.
        payout: String,
    },
    /// The contract was abandoned and returned to the board.
    Abandoned {
        /// The abandoned instance.
        quest_id: QuestId,
    },
    /// The group was restored after a reconnect.
    Restored {
        /// The restored instance.
        quest_id: QuestId,
        /// Number of units recreated.
        unit_count: usize,
    },
    /// Directional cue toward the current target.
    Navigation {
        /// The tracked instance.
        quest_id: QuestId,
        /// Arrow glyph for the relative bearing.
        arrow: char,
        /// Horizontal distance to the target.
        distance: f64,
        /// Whether the vertical beacon is shown.
        beacon_active: bool,
        /// Whether the beacon is in the lit phase of its pulse.
        beacon_lit: bool,
    },
}

/// Delivers notices to players.
pub trait Notifier: Send + Sync {
    /// Deliver a notice.
    fn notify(&self, player: PlayerId, notice: &Notice);
}

/// Notifier that only records notices in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, player: PlayerId, notice: &Notice) {
        if matches!(notice, Notice::Navigation { .. }) {
            tracing::trace!(%player, ?notice, "navigation hint");
        } else {
            info!(%player, ?notice, "encounter notice");
        }
    }
}

//! Reward collaborator abstraction.
//!
//! Payout amounts are computed elsewhere; this runtime only hands over the
//! completed encounter once its objects are gone.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::encounter::{Composition, Tier};
use crate::error::DomainError;
use crate::ids::{PlayerId, QuestId};

/// A completed encounter presented for payout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardClaim {
    /// The player turning in.
    pub player_id: PlayerId,
    /// The completed instance.
    pub quest_id: QuestId,
    /// Tier of the completed instance.
    pub tier: Tier,
    /// Composition that was defeated.
    pub composition: Composition,
    /// Number of counted units defeated.
    pub units_defeated: u32,
}

/// Opaque payout description returned by the reward collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    /// Human-readable summary shown to the player.
    pub summary: String,
    /// Collaborator-specific details.
    #[serde(default)]
    pub details: serde_json::Value,
}

/// Hands completed encounters to the reward system.
#[async_trait]
pub trait RewardService: Send + Sync {
    /// Grant the payout for a completed encounter.
    async fn grant(&self, claim: &RewardClaim) -> Result<Payout, DomainError>;
}

//! Reward hand-off used by the standalone sidecar.
//!
//! Payout amounts belong to the host economy. The sidecar logs each claim
//! and answers with a summary the player notice can show.

use async_trait::async_trait;
use encounter_core::error::DomainError;
use encounter_core::reward::{Payout, RewardClaim, RewardService};
use serde_json::json;
use tracing::info;

/// Reward service that records claims in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggedRewardService;

#[async_trait]
impl RewardService for LoggedRewardService {
    async fn grant(&self, claim: &RewardClaim) -> Result<Payout, DomainError> {
        info!(
            player_id = %claim.player_id,
            quest_id = %claim.quest_id,
            tier = %claim.tier,
            units_defeated = claim.units_defeated,
            "reward claim handed off"
        );
        Ok(Payout {
            summary: format!(
                "{} contract complete: {} units defeated",
                claim.tier, claim.units_defeated
            ),
            details: json!({ "tier": claim.tier, "units_defeated": claim.units_defeated }),
        })
    }
}

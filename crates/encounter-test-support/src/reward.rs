//! Test reward service: returns a fixed payout and records claims.

use std::sync::Mutex;

use async_trait::async_trait;
use encounter_core::error::DomainError;
use encounter_core::reward::{Payout, RewardClaim, RewardService};

/// A reward service that pays a fixed summary and records every claim.
#[derive(Debug, Default)]
pub struct FixedRewardService {
    claims: Mutex<Vec<RewardClaim>>,
}

impl FixedRewardService {
    /// Create a reward service with no recorded claims.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all claims granted so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn claims(&self) -> Vec<RewardClaim> {
        self.claims.lock().unwrap().clone()
    }
}

#[async_trait]
impl RewardService for FixedRewardService {
    async fn grant(&self, claim: &RewardClaim) -> Result<Payout, DomainError> {
        self.claims.lock().unwrap().push(claim.clone());
        Ok(Payout {
            summary: format!("{} units defeated", claim.units_defeated),
            details: serde_json::Value::Null,
        })
    }
}

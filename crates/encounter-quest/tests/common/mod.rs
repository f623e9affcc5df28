//! Wiring shared by the lifecycle scenarios.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{TimeDelta, TimeZone, Utc};
use encounter_core::config::EncounterConfig;
use encounter_core::geometry::Position;
use encounter_core::ids::{DimensionId, ObjectId, PlayerId};
use encounter_core::rng::SeededRng;
use encounter_core::world::PlayerPose;
use encounter_quest::application::command_handlers::{
    KillAttribution, handle_accept, handle_disconnect, handle_object_death, handle_reconnect,
};
use encounter_quest::application::context::EncounterContext;
use encounter_quest::application::proximity::run_scan;
use encounter_quest::domain::aggregates::EncounterInstance;
use encounter_quest::domain::commands::{
    AcceptEncounter, DisconnectPlayer, EncounterOffer, ReconnectPlayer, RecordObjectDeath,
};
use encounter_test_support::{FixedRewardService, ManualClock, MemoryQuestStore, RecordingNotifier};
use encounter_world::domain::ownership::quest_tag;
use encounter_world::infrastructure::grid_world::GridWorld;
use uuid::Uuid;

pub struct Harness {
    pub ctx: EncounterContext,
    pub world: Arc<GridWorld>,
    pub store: Arc<MemoryQuestStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub rewards: Arc<FixedRewardService>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::over(
            Arc::new(GridWorld::flat(63)),
            Arc::new(MemoryQuestStore::new()),
        )
    }

    /// A fresh runtime over an existing world and store, as after a restart.
    pub fn over(world: Arc<GridWorld>, store: Arc<MemoryQuestStore>) -> Self {
        let notifier = Arc::new(RecordingNotifier::new());
        let rewards = Arc::new(FixedRewardService::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 18, 30, 0).unwrap(),
        ));
        let ctx = EncounterContext::new(
            EncounterConfig::default(),
            world.clone(),
            store.clone(),
            rewards.clone(),
            notifier.clone(),
            clock.clone(),
            Arc::new(Mutex::new(SeededRng::from_seed(42))),
        );
        Self {
            ctx,
            world,
            store,
            notifier,
            rewards,
            clock,
        }
    }

    pub async fn active(&self, player_id: PlayerId) -> Option<EncounterInstance> {
        self.ctx.load_record(player_id).await.active
    }

    pub async fn accept(&self, player_id: PlayerId, offer: EncounterOffer) -> EncounterInstance {
        handle_accept(
            &AcceptEncounter {
                correlation_id: Uuid::new_v4(),
                player_id,
                offer,
            },
            &self.ctx,
        )
        .await
        .unwrap();
        self.active(player_id).await.unwrap()
    }

    pub fn join(&self, player_id: PlayerId, pose_at: Position) {
        self.world.join(
            player_id,
            PlayerPose {
                dimension: DimensionId::new("overworld"),
                position: pose_at,
                yaw: 0.0,
            },
        );
    }

    /// Walks the player to the zone centre and runs scans until the nearing
    /// delay has passed.
    pub async fn walk_into_zone(&self, player_id: PlayerId) {
        let center = self.active(player_id).await.unwrap().zone.center;
        self.join(player_id, center);
        run_scan(&self.ctx).await.unwrap();
        self.clock.advance(TimeDelta::seconds(1));
        run_scan(&self.ctx).await.unwrap();
    }

    /// Live objects the world reports for the player's active instance.
    pub async fn live_objects(&self, player_id: PlayerId) -> Vec<ObjectId> {
        let quest_id = self.active(player_id).await.unwrap().id;
        let tag = quest_tag(quest_id);
        self.world
            .objects()
            .into_iter()
            .filter(|info| info.tags.contains(&tag))
            .map(|info| info.id)
            .collect()
    }

    /// Kills an object in the world and feeds the death to the lifecycle.
    pub async fn kill(&self, object_id: ObjectId) -> KillAttribution {
        let info = self.world.kill(object_id).unwrap();
        handle_object_death(
            &RecordObjectDeath {
                correlation_id: Uuid::new_v4(),
                object_id,
                unit_type: info.unit_type,
                tags: info.tags,
            },
            &self.ctx,
        )
        .await
        .unwrap()
    }

    pub async fn disconnect(&self, player_id: PlayerId) {
        self.world.leave(player_id);
        handle_disconnect(
            &DisconnectPlayer {
                correlation_id: Uuid::new_v4(),
                player_id,
            },
            &self.ctx,
        )
        .await
        .unwrap();
    }

    pub async fn reconnect(&self, player_id: PlayerId, position: Position) {
        self.join(player_id, position);
        handle_reconnect(
            &ReconnectPlayer {
                correlation_id: Uuid::new_v4(),
                player_id,
            },
            &self.ctx,
        )
        .await
        .unwrap();
    }
}

//! Shared wiring for the application-layer tests.

use std::sync::{Arc, Mutex};

use chrono::{TimeDelta, TimeZone, Utc};
use encounter_core::config::EncounterConfig;
use encounter_core::encounter::{Composition, Tier};
use encounter_core::geometry::Position;
use encounter_core::ids::{DimensionId, PlayerId, QuestId};
use encounter_core::rng::SeededRng;
use encounter_core::store::QuestStore;
use encounter_core::world::PlayerPose;
use encounter_test_support::{
    FailingQuestStore, FixedRewardService, ManualClock, MemoryQuestStore, RecordingNotifier,
    YieldingQuestStore,
};
use encounter_world::infrastructure::grid_world::GridWorld;
use uuid::Uuid;

use crate::application::command_handlers::{handle_abandon, handle_accept, handle_disconnect};
use crate::application::context::EncounterContext;
use crate::application::proximity::run_scan;
use crate::domain::aggregates::EncounterInstance;
use crate::domain::commands::{AbandonEncounter, AcceptEncounter, DisconnectPlayer, EncounterOffer};

pub(crate) struct Fixture {
    pub ctx: EncounterContext,
    pub world: Arc<GridWorld>,
    pub store: Arc<MemoryQuestStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub rewards: Arc<FixedRewardService>,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(MemoryQuestStore::new());
        Self::build(store.clone(), store)
    }

    pub fn with_failing_store() -> Self {
        Self::build(
            Arc::new(MemoryQuestStore::new()),
            Arc::new(FailingQuestStore),
        )
    }

    pub fn with_yielding_store() -> Self {
        let store = Arc::new(MemoryQuestStore::new());
        Self::build(store.clone(), Arc::new(YieldingQuestStore::new(store)))
    }

    fn build(store: Arc<MemoryQuestStore>, backing: Arc<dyn QuestStore>) -> Self {
        let world = Arc::new(GridWorld::flat(63));
        let notifier = Arc::new(RecordingNotifier::new());
        let rewards = Arc::new(FixedRewardService::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        ));
        let ctx = EncounterContext::new(
            EncounterConfig::default(),
            world.clone(),
            backing,
            rewards.clone(),
            notifier.clone(),
            clock.clone(),
            Arc::new(Mutex::new(SeededRng::from_seed(7))),
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

    pub fn place(&self, player_id: PlayerId, position: Position) {
        self.world.join(
            player_id,
            PlayerPose {
                dimension: DimensionId::new("overworld"),
                position,
                yaw: 0.0,
            },
        );
    }

    pub async fn pending_encounter(
        &self,
        player_id: PlayerId,
        composition: Composition,
    ) -> EncounterInstance {
        handle_accept(
            &AcceptEncounter {
                correlation_id: Uuid::new_v4(),
                player_id,
                offer: EncounterOffer::Custom {
                    tier: Tier::Rare,
                    composition,
                },
            },
            &self.ctx,
        )
        .await
        .unwrap();
        self.active(player_id).await.unwrap()
    }

    pub async fn trigger_and_spawn(&self) {
        run_scan(&self.ctx).await.unwrap();
        self.clock.advance(TimeDelta::seconds(1));
        run_scan(&self.ctx).await.unwrap();
    }

    pub async fn spawned_encounter(
        &self,
        player_id: PlayerId,
        composition: Composition,
    ) -> QuestId {
        let instance = self.pending_encounter(player_id, composition).await;
        self.place(player_id, instance.zone.center);
        self.trigger_and_spawn().await;
        let active = self.active(player_id).await.unwrap();
        assert!(active.spawn_record().is_some());
        instance.id
    }

    pub async fn abandon(&self, player_id: PlayerId) {
        handle_abandon(
            &AbandonEncounter {
                correlation_id: Uuid::new_v4(),
                player_id,
            },
            &self.ctx,
        )
        .await
        .unwrap();
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
}

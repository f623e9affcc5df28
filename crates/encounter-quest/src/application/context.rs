//! Collaborators shared by every lifecycle operation.

use std::sync::{Arc, Mutex, MutexGuard};

use encounter_core::clock::Clock;
use encounter_core::config::EncounterConfig;
use encounter_core::encounter::Composition;
use encounter_core::error::DomainError;
use encounter_core::geometry::Position;
use encounter_core::ids::{DimensionId, PlayerId, QuestId};
use encounter_core::notify::Notifier;
use encounter_core::reward::RewardService;
use encounter_core::rng::DeterministicRng;
use encounter_core::store::QuestStore;
use encounter_core::world::{ObjectInfo, WorldSurface};
use encounter_world::application::spawner::{SpawnOrchestrator, SpawnOutcome};
use encounter_world::domain::ownership::OwnershipRegistry;
use encounter_world::domain::zone::ZoneSelector;
use tracing::warn;

use crate::application::sessions::SessionRegistry;
use crate::application::work_gate::{ExclusiveWork, PlayerWork, WorkGate};
use crate::domain::record::QuestRecord;

/// Locks a shared mutex, mapping poisoning to an infrastructure error.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the mutex is poisoned.
pub fn lock<'a, T: ?Sized>(
    mutex: &'a Mutex<T>,
    what: &str,
) -> Result<MutexGuard<'a, T>, DomainError> {
    mutex
        .lock()
        .map_err(|e| DomainError::Infrastructure(format!("{what} mutex poisoned: {e}")))
}

/// The collaborators and in-memory registries behind the lifecycle.
///
/// Mutexes are held only around synchronous work, never across an await.
#[derive(Clone)]
pub struct EncounterContext {
    /// Runtime configuration.
    pub config: Arc<EncounterConfig>,
    /// The host world.
    pub world: Arc<dyn WorldSurface>,
    /// Per-player quest documents.
    pub store: Arc<dyn QuestStore>,
    /// Payout collaborator.
    pub rewards: Arc<dyn RewardService>,
    /// Player notices.
    pub notifier: Arc<dyn Notifier>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Random source for zone sampling and jitter.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    /// Typed owner map.
    pub ownership: Arc<Mutex<OwnershipRegistry>>,
    /// Per-player sessions.
    pub sessions: Arc<Mutex<SessionRegistry>>,
    /// Zone sampling.
    pub zones: ZoneSelector,
    /// Group creation and removal.
    pub spawner: SpawnOrchestrator,
    /// Serializes work per player and against the sweep.
    pub gate: Arc<WorkGate>,
}

impl EncounterContext {
    /// Builds a context with empty registries.
    #[must_use]
    pub fn new(
        config: EncounterConfig,
        world: Arc<dyn WorldSurface>,
        store: Arc<dyn QuestStore>,
        rewards: Arc<dyn RewardService>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    ) -> Self {
        Self {
            zones: ZoneSelector::from_config(&config),
            spawner: SpawnOrchestrator::from_config(&config),
            config: Arc::new(config),
            world,
            store,
            rewards,
            notifier,
            clock,
            rng,
            ownership: Arc::new(Mutex::new(OwnershipRegistry::new())),
            sessions: Arc::new(Mutex::new(SessionRegistry::new())),
            gate: Arc::new(WorkGate::new()),
        }
    }

    /// Waits for exclusive use of the player's document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the lock table is poisoned.
    pub async fn enter(&self, player_id: PlayerId) -> Result<PlayerWork, DomainError> {
        self.gate.enter(player_id).await
    }

    /// Waits until no player work is in flight and holds new work back.
    pub async fn exclusive(&self) -> ExclusiveWork {
        self.gate.exclusive().await
    }

    /// Loads the player's document. Read failures are logged and treated as
    /// "no data".
    pub async fn load_record(&self, player_id: PlayerId) -> QuestRecord {
        match self.store.load(player_id).await {
            Ok(Some(stored)) => QuestRecord::from_stored(&stored).unwrap_or_else(|err| {
                warn!(%player_id, %err, "unreadable quest record, starting fresh");
                QuestRecord::default()
            }),
            Ok(None) => QuestRecord::default(),
            Err(err) => {
                warn!(%player_id, %err, "quest record load failed, treating as empty");
                QuestRecord::default()
            }
        }
    }

    /// Saves the player's document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if encoding or the store fails.
    pub async fn save_record(
        &self,
        player_id: PlayerId,
        record: &QuestRecord,
    ) -> Result<(), DomainError> {
        let stored = record.to_stored(player_id, self.clock.now())?;
        self.store.save(stored).await
    }

    /// Finds the player whose active instance is `quest_id`: connected
    /// sessions first, then every stored document.
    pub async fn owner_of(&self, quest_id: QuestId) -> Option<PlayerId> {
        let connected = lock(&self.sessions, "session registry")
            .ok()
            .and_then(|sessions| sessions.player_for(quest_id));
        if connected.is_some() {
            return connected;
        }
        let players = match self.store.list_players().await {
            Ok(players) => players,
            Err(err) => {
                warn!(%quest_id, %err, "cannot enumerate players to resolve owner");
                return None;
            }
        };
        for player_id in players {
            let record = self.load_record(player_id).await;
            if record.active_with_id(quest_id).is_some() {
                return Some(player_id);
            }
        }
        None
    }

    /// Creates a group owned by `quest_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if a registry mutex is poisoned.
    pub fn spawn(
        &self,
        quest_id: QuestId,
        composition: &Composition,
        point: Position,
        dimension: &DimensionId,
    ) -> Result<SpawnOutcome, DomainError> {
        let mut rng = lock(&self.rng, "rng")?;
        let mut ownership = lock(&self.ownership, "ownership registry")?;
        Ok(self.spawner.spawn(
            self.world.as_ref(),
            &mut ownership,
            &mut *rng,
            quest_id,
            composition,
            point,
            dimension,
        ))
    }

    /// Removes every live object owned by `quest_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the ownership mutex is
    /// poisoned.
    pub fn despawn(&self, quest_id: QuestId) -> Result<usize, DomainError> {
        let mut ownership = lock(&self.ownership, "ownership registry")?;
        let world = self.world.as_ref();
        Ok(self.spawner.despawn(world, &mut ownership, quest_id))
    }

    /// Live objects owned by `quest_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the ownership mutex is
    /// poisoned.
    pub fn live_objects(&self, quest_id: QuestId) -> Result<Vec<ObjectInfo>, DomainError> {
        let ownership = lock(&self.ownership, "ownership registry")?;
        let world = self.world.as_ref();
        Ok(self.spawner.live_objects(world, &ownership, quest_id))
    }

    /// Number of live objects owned by `quest_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the ownership mutex is
    /// poisoned.
    pub fn count_live(&self, quest_id: QuestId) -> Result<usize, DomainError> {
        let ownership = lock(&self.ownership, "ownership registry")?;
        let world = self.world.as_ref();
        Ok(self.spawner.count_live(world, &ownership, quest_id))
    }

    /// A spawn point for a group summoned next to a player: a valid point in
    /// the near band, or the surface of the player's own column.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the rng mutex is poisoned.
    pub fn spawn_point_near(
        &self,
        dimension: &DimensionId,
        player_position: Position,
    ) -> Result<Position, DomainError> {
        let near = {
            let mut rng = lock(&self.rng, "rng")?;
            self.zones
                .find_near_point(self.world.as_ref(), &mut *rng, dimension, player_position)
        };
        if let Some(point) = near {
            return Ok(point);
        }
        warn!(x = player_position.x, z = player_position.z, "no near point, using player column");
        let block = player_position.block();
        Ok(self
            .world
            .surface_height(dimension, block.x, block.z)
            .map_or(player_position, |y| {
                Position::new(player_position.x, f64::from(y) + 1.0, player_position.z)
            }))
    }
}

//! Spawn orchestration.
//!
//! Materialises a composition at a point, marks every created object with
//! its owner, and removes objects by owner. Creation against a region that
//! is not resident is handed back as deferred work for one retry on the next
//! scheduling step; any other creation failure is logged and the spawn runs
//! short.

use std::collections::{BTreeMap, HashSet};

use encounter_core::config::EncounterConfig;
use encounter_core::encounter::Composition;
use encounter_core::geometry::Position;
use encounter_core::ids::{DimensionId, ObjectId, QuestId};
use encounter_core::rng::DeterministicRng;
use encounter_core::world::{ObjectInfo, StandingEffect, WorldError, WorldSurface};
use tracing::{debug, info, warn};

use crate::domain::ownership::{OwnershipRegistry, SYSTEM_TAG, quest_tag};

/// A creation that hit a non-resident region and awaits its single retry.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredCreate {
    /// Owner of the object to create.
    pub quest_id: QuestId,
    /// Target dimension.
    pub dimension: DimensionId,
    /// Unit type to create.
    pub unit_type: String,
    /// Display name, if any.
    pub name_override: Option<String>,
    /// Already-jittered position.
    pub position: Position,
}

/// Result of a spawn request.
#[derive(Debug, Default)]
pub struct SpawnOutcome {
    /// Objects created and tagged.
    pub object_ids: Vec<ObjectId>,
    /// Creations to retry on the next step.
    pub deferred: Vec<DeferredCreate>,
    /// Creations dropped outright.
    pub failed: usize,
}

/// Creates and removes encounter creature groups.
#[derive(Debug, Clone)]
pub struct SpawnOrchestrator {
    jitter: f64,
    burn_immune_types: Vec<String>,
}

impl SpawnOrchestrator {
    /// Builds an orchestrator from the runtime configuration.
    #[must_use]
    pub fn from_config(config: &EncounterConfig) -> Self {
        Self {
            jitter: config.spawn_jitter.max(0.0),
            burn_immune_types: config.burn_immune_types.clone(),
        }
    }

    /// Creates every unit of `composition` around `point`.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &self,
        world: &dyn WorldSurface,
        registry: &mut OwnershipRegistry,
        rng: &mut dyn DeterministicRng,
        quest_id: QuestId,
        composition: &Composition,
        point: Position,
        dimension: &DimensionId,
    ) -> SpawnOutcome {
        let mut outcome = SpawnOutcome::default();

        for group in composition.groups() {
            for _ in 0..group.count {
                let position = self.jittered(rng, point);
                match self.create_one(
                    world,
                    registry,
                    quest_id,
                    dimension,
                    &group.unit_type,
                    group.name_override.as_deref(),
                    position,
                ) {
                    Ok(id) => outcome.object_ids.push(id),
                    Err(WorldError::RegionNotResident(block)) => {
                        debug!(%quest_id, ?block, "region not resident, deferring creation");
                        outcome.deferred.push(DeferredCreate {
                            quest_id,
                            dimension: dimension.clone(),
                            unit_type: group.unit_type.clone(),
                            name_override: group.name_override.clone(),
                            position,
                        });
                    }
                    Err(err) => {
                        warn!(%quest_id, unit_type = %group.unit_type, %err, "unit not created");
                        outcome.failed += 1;
                    }
                }
            }
        }

        info!(
            %quest_id,
            created = outcome.object_ids.len(),
            deferred = outcome.deferred.len(),
            failed = outcome.failed,
            "spawned encounter group"
        );
        outcome
    }

    /// Makes the single retry of deferred creations. Anything that still
    /// fails is dropped.
    pub fn retry_deferred(
        &self,
        world: &dyn WorldSurface,
        registry: &mut OwnershipRegistry,
        deferred: Vec<DeferredCreate>,
    ) -> Vec<(QuestId, ObjectId)> {
        let mut created = Vec::new();
        for request in deferred {
            match self.create_one(
                world,
                registry,
                request.quest_id,
                &request.dimension,
                &request.unit_type,
                request.name_override.as_deref(),
                request.position,
            ) {
                Ok(id) => created.push((request.quest_id, id)),
                Err(err) => {
                    warn!(quest_id = %request.quest_id, unit_type = %request.unit_type, %err,
                        "deferred creation failed again, dropping");
                }
            }
        }
        created
    }

    #[allow(clippy::too_many_arguments)]
    fn create_one(
        &self,
        world: &dyn WorldSurface,
        registry: &mut OwnershipRegistry,
        quest_id: QuestId,
        dimension: &DimensionId,
        unit_type: &str,
        name: Option<&str>,
        position: Position,
    ) -> Result<ObjectId, WorldError> {
        let id = world.create_object(dimension, unit_type, position, name)?;
        if let Err(err) = registry.tag(world, id, quest_id) {
            world.remove_object(id);
            return Err(WorldError::Rejected(err.to_string()));
        }
        if self.burn_immune_types.iter().any(|t| t == unit_type)
            && !world.apply_effect(id, StandingEffect::FireImmunity)
        {
            debug!(object_id = %id, "object vanished before immunity could be applied");
        }
        Ok(id)
    }

    fn jittered(&self, rng: &mut dyn DeterministicRng, point: Position) -> Position {
        if self.jitter <= 0.0 {
            return point;
        }
        let dx = (rng.next_f64() * 2.0 - 1.0) * self.jitter;
        let dz = (rng.next_f64() * 2.0 - 1.0) * self.jitter;
        point.offset(dx, dz)
    }

    /// Removes every live object owned by `quest_id`. Objects already gone
    /// are skipped, so a second call removes nothing.
    pub fn despawn(
        &self,
        world: &dyn WorldSurface,
        registry: &mut OwnershipRegistry,
        quest_id: QuestId,
    ) -> usize {
        let mut candidates: HashSet<ObjectId> = registry.objects_of(quest_id).into_iter().collect();
        candidates.extend(
            world
                .objects_with_tag(&quest_tag(quest_id))
                .into_iter()
                .map(|info| info.id),
        );

        let mut removed = 0;
        for object in candidates {
            if world.remove_object(object) {
                removed += 1;
            }
            registry.forget(object);
        }
        if removed > 0 {
            info!(%quest_id, removed, "despawned encounter objects");
        }
        removed
    }

    /// Removes every owned object within `radius` of `center`, whatever its
    /// owner.
    pub fn despawn_within(
        &self,
        world: &dyn WorldSurface,
        registry: &mut OwnershipRegistry,
        dimension: &DimensionId,
        center: Position,
        radius: f64,
    ) -> usize {
        let mut removed = 0;
        for info in world.objects_with_tag(SYSTEM_TAG) {
            if &info.dimension != dimension || center.horizontal_distance(&info.position) > radius {
                continue;
            }
            if world.remove_object(info.id) {
                removed += 1;
            }
            registry.forget(info.id);
        }
        removed
    }

    /// Live objects owned by `quest_id`, found by tag or through the typed
    /// map.
    #[must_use]
    pub fn live_objects(
        &self,
        world: &dyn WorldSurface,
        registry: &OwnershipRegistry,
        quest_id: QuestId,
    ) -> Vec<ObjectInfo> {
        let mut live: BTreeMap<ObjectId, ObjectInfo> = world
            .objects_with_tag(&quest_tag(quest_id))
            .into_iter()
            .map(|info| (info.id, info))
            .collect();
        for id in registry.objects_of(quest_id) {
            if live.contains_key(&id) {
                continue;
            }
            if let Some(info) = world.object(id) {
                live.insert(id, info);
            }
        }
        live.into_values().collect()
    }

    /// Number of live objects owned by `quest_id`.
    #[must_use]
    pub fn count_live(
        &self,
        world: &dyn WorldSurface,
        registry: &OwnershipRegistry,
        quest_id: QuestId,
    ) -> usize {
        self.live_objects(world, registry, quest_id).len()
    }
}

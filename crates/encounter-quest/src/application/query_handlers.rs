//! Query handlers for encounter instances.
//!
//! Views are read from the player's stored document and joined with the
//! live world state (object counts and in-flight spawn sequences).

use encounter_core::encounter::{Composition, Tier};
use encounter_core::error::DomainError;
use encounter_core::geometry::Position;
use encounter_core::ids::{DimensionId, PlayerId, QuestId};
use encounter_world::domain::zone::Zone;
use serde::Serialize;

use crate::application::context::{EncounterContext, lock};
use crate::domain::aggregates::EncounterInstance;

/// Read-only view of an encounter instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncounterView {
    /// The instance identifier.
    pub quest_id: QuestId,
    /// The owning player.
    pub player_id: PlayerId,
    /// Contract the instance came from.
    pub contract: Option<String>,
    /// Rarity tier.
    pub tier: Tier,
    /// `pending`, `spawning` or `spawned`.
    pub state: &'static str,
    /// Counted units defeated.
    pub progress: u32,
    /// Counted units required.
    pub total_unit_count: u32,
    /// The group.
    pub composition: Composition,
    /// Assigned zone.
    pub zone: Zone,
    /// Whether the zone is the tier's backup location.
    pub backup_location: bool,
    /// Dimension of the zone.
    pub dimension: DimensionId,
    /// Where the group was placed, once spawned.
    pub spawn_location: Option<Position>,
    /// Live objects owned by the instance.
    pub live_count: usize,
    /// Event count.
    pub version: i64,
}

/// A player's active slot and available pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerEncountersView {
    /// The player.
    pub player_id: PlayerId,
    /// The active encounter, if any.
    pub active: Option<EncounterView>,
    /// Abandoned instances that can be accepted again.
    pub available: Vec<EncounterView>,
}

fn view(
    ctx: &EncounterContext,
    instance: &EncounterInstance,
) -> Result<EncounterView, DomainError> {
    let spawning = lock(&ctx.sessions, "session registry")?.is_spawning(instance.id);
    let state = if spawning && instance.is_pending() {
        "spawning"
    } else {
        instance.phase.name()
    };
    let live_count = match instance.spawn_record() {
        Some(_) => ctx.count_live(instance.id)?,
        None => 0,
    };
    Ok(EncounterView {
        quest_id: instance.id,
        player_id: instance.player_id,
        contract: instance.contract.clone(),
        tier: instance.tier,
        state,
        progress: instance.progress,
        total_unit_count: instance.total_unit_count,
        composition: instance.composition.clone(),
        zone: instance.zone.clone(),
        backup_location: instance.backup_location,
        dimension: instance.dimension.clone(),
        spawn_location: instance.spawn_record().map(|spawn| spawn.location),
        live_count,
        version: instance.version,
    })
}

/// Retrieves the player's active encounter and available pool.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if a registry mutex is poisoned.
pub async fn get_player_encounters(
    ctx: &EncounterContext,
    player_id: PlayerId,
) -> Result<PlayerEncountersView, DomainError> {
    let record = ctx.load_record(player_id).await;
    let active = record
        .active
        .as_ref()
        .map(|instance| view(ctx, instance))
        .transpose()?;
    let available = record
        .available
        .iter()
        .map(|instance| view(ctx, instance))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PlayerEncountersView {
        player_id,
        active,
        available,
    })
}

/// Retrieves the player's active encounter.
///
/// # Errors
///
/// Returns `DomainError::NoActiveEncounter` if the slot is empty.
pub async fn get_active_encounter(
    ctx: &EncounterContext,
    player_id: PlayerId,
) -> Result<EncounterView, DomainError> {
    let record = ctx.load_record(player_id).await;
    let instance = record
        .active
        .as_ref()
        .ok_or(DomainError::NoActiveEncounter(player_id))?;
    view(ctx, instance)
}

/// Retrieves an active encounter by its id.
///
/// # Errors
///
/// Returns `DomainError::EncounterNotFound` if no player holds it as their
/// active encounter.
pub async fn get_encounter_by_id(
    ctx: &EncounterContext,
    quest_id: QuestId,
) -> Result<EncounterView, DomainError> {
    let player_id = ctx
        .owner_of(quest_id)
        .await
        .ok_or(DomainError::EncounterNotFound(quest_id))?;
    let record = ctx.load_record(player_id).await;
    let instance = record
        .active_with_id(quest_id)
        .ok_or(DomainError::EncounterNotFound(quest_id))?;
    view(ctx, instance)
}

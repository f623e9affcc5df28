//! Command handlers for encounter instances.
//!
//! Each handler enters the player's work gate, loads the player's document,
//! applies the transition to the aggregate, saves the document and forwards
//! player-facing notices. The gate is held from load to save, so events for
//! one player are applied one at a time.

use encounter_core::error::DomainError;
use encounter_core::ids::{ObjectId, PlayerId, QuestId};
use encounter_core::notify::Notice;
use encounter_core::reward::RewardClaim;
use encounter_core::world::DamageCause;
use encounter_world::domain::ownership::owner_from_tags;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::application::context::{EncounterContext, lock};
use crate::domain::aggregates::EncounterInstance;
use crate::domain::commands::{
    AbandonEncounter, AcceptEncounter, DisconnectPlayer, EncounterOffer, ReconnectPlayer,
    RecordObjectDeath, TurnInEncounter,
};
use crate::domain::events::EncounterEvent;

/// How an object death was attributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "attribution", rename_all = "snake_case")]
pub enum KillAttribution {
    /// Not an encounter object; ordinary kill tracking applies.
    NotOwned,
    /// Owned, but no player's active, spawned instance matches.
    Orphaned {
        /// The owner named by the object.
        quest_id: QuestId,
    },
    /// An auxiliary unit; it does not count.
    Uncounted {
        /// The owning instance.
        quest_id: QuestId,
    },
    /// Counted toward the owner's progress.
    Counted {
        /// The owning instance.
        quest_id: QuestId,
        /// The owning player.
        player_id: PlayerId,
        /// Progress after the kill.
        progress: u32,
        /// Units required.
        total: u32,
        /// Whether this kill completed the encounter.
        completed: bool,
    },
}

/// Whether a damage event may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageVerdict {
    /// Let the damage through.
    Allow,
    /// Cancel the damage.
    Cancel,
}

/// Handles `AcceptEncounter`: resolves the offer, selects a zone around the
/// anchor and fills the player's active slot.
///
/// # Errors
///
/// Returns `DomainError::InvalidTransition` if the slot is taken,
/// `DomainError::Validation` for an unknown contract or unusable
/// composition, `DomainError::EncounterNotFound` if a pooled instance is
/// missing, and `DomainError::Infrastructure` if saving fails.
#[instrument(skip_all, fields(player_id = %command.player_id))]
pub async fn handle_accept(
    command: &AcceptEncounter,
    ctx: &EncounterContext,
) -> Result<Vec<EncounterEvent>, DomainError> {
    let player_id = command.player_id;
    let _work = ctx.enter(player_id).await?;
    let mut record = ctx.load_record(player_id).await;
    if let Some(active) = &record.active {
        return Err(DomainError::InvalidTransition {
            quest_id: active.id,
            state: active.phase.name().to_owned(),
            action: "replace",
        });
    }

    let (quest_id, contract, tier, composition) = match &command.offer {
        EncounterOffer::Contract { name } => {
            let template = ctx
                .config
                .contracts
                .get(name)
                .ok_or_else(|| DomainError::Validation(format!("unknown contract: {name}")))?;
            (
                QuestId::new(),
                Some(name.clone()),
                template.tier,
                template.composition.clone(),
            )
        }
        EncounterOffer::Custom { tier, composition } => {
            (QuestId::new(), None, *tier, composition.clone())
        }
        EncounterOffer::Available { quest_id } => {
            let pooled = record
                .take_available(*quest_id)
                .ok_or(DomainError::EncounterNotFound(*quest_id))?;
            (pooled.id, pooled.contract, pooled.tier, pooled.composition)
        }
    };

    let dimension = ctx
        .world
        .player_pose(player_id)
        .map(|pose| pose.dimension)
        .unwrap_or_else(|| ctx.config.default_dimension.clone());
    // A re-accepted instance gets a fresh zone.
    let selection = {
        let mut rng = lock(&ctx.rng, "rng")?;
        let world = ctx.world.as_ref();
        ctx.zones
            .select_zone(world, &mut *rng, &dimension, ctx.config.anchor, tier)
    };
    let zone = ctx.zones.zone_for(&selection, tier);

    let mut instance = EncounterInstance::accept(
        quest_id,
        player_id,
        contract,
        tier,
        composition,
        zone,
        selection.used_fallback,
        dimension,
        command.correlation_id,
        ctx.clock.as_ref(),
    )?;
    let events = instance.take_uncommitted_events();
    record.active = Some(instance);
    ctx.save_record(player_id, &record).await?;

    lock(&ctx.sessions, "session registry")?.track(player_id, Some(quest_id));
    ctx.notifier.notify(
        player_id,
        &Notice::ZoneAssigned {
            quest_id,
            tier,
            center: selection.point,
            backup_location: selection.used_fallback,
        },
    );
    info!(%quest_id, %tier, backup_location = selection.used_fallback, "encounter accepted");
    Ok(events)
}

/// Handles `AbandonEncounter`: removes the group, resets the instance and
/// returns it to the player's available pool.
///
/// # Errors
///
/// Returns `DomainError::NoActiveEncounter` if the slot is empty and
/// `DomainError::Infrastructure` if saving fails.
#[instrument(skip_all, fields(player_id = %command.player_id))]
pub async fn handle_abandon(
    command: &AbandonEncounter,
    ctx: &EncounterContext,
) -> Result<Vec<EncounterEvent>, DomainError> {
    let player_id = command.player_id;
    let _work = ctx.enter(player_id).await?;
    let mut record = ctx.load_record(player_id).await;
    let mut instance = record
        .active
        .take()
        .ok_or(DomainError::NoActiveEncounter(player_id))?;
    let quest_id = instance.id;

    lock(&ctx.sessions, "session registry")?.clear_quest(quest_id);
    let removed = ctx.despawn(quest_id)?;
    instance.abandon(removed, command.correlation_id, ctx.clock.as_ref());
    let events = instance.take_uncommitted_events();
    record.available.push(instance);
    ctx.save_record(player_id, &record).await?;

    ctx.notifier
        .notify(player_id, &Notice::Abandoned { quest_id });
    info!(%quest_id, removed, "encounter abandoned");
    Ok(events)
}

/// Handles `TurnInEncounter`: removes any remaining objects, hands the
/// completed instance to the reward collaborator and empties the slot.
///
/// # Errors
///
/// Returns `DomainError::NoActiveEncounter` if the slot is empty,
/// `DomainError::InvalidTransition` if the encounter is not complete, and any
/// error from the reward collaborator or the store.
#[instrument(skip_all, fields(player_id = %command.player_id))]
pub async fn handle_turn_in(
    command: &TurnInEncounter,
    ctx: &EncounterContext,
) -> Result<Vec<EncounterEvent>, DomainError> {
    let player_id = command.player_id;
    let _work = ctx.enter(player_id).await?;
    let mut record = ctx.load_record(player_id).await;
    let instance = record
        .active
        .as_ref()
        .ok_or(DomainError::NoActiveEncounter(player_id))?;
    instance.ensure_turn_in_ready()?;
    let quest_id = instance.id;

    let removed = ctx.despawn(quest_id)?;
    let claim = RewardClaim {
        player_id,
        quest_id,
        tier: instance.tier,
        composition: instance.composition.clone(),
        units_defeated: instance.progress,
    };
    let payout = ctx.rewards.grant(&claim).await?;

    let mut instance = record
        .active
        .take()
        .ok_or(DomainError::EncounterNotFound(quest_id))?;
    instance.turn_in(
        removed,
        payout.summary.clone(),
        command.correlation_id,
        ctx.clock.as_ref(),
    )?;
    let events = instance.take_uncommitted_events();
    ctx.save_record(player_id, &record).await?;

    lock(&ctx.sessions, "session registry")?.clear_quest(quest_id);
    ctx.notifier.notify(
        player_id,
        &Notice::TurnedIn {
            quest_id,
            payout: payout.summary,
        },
    );
    info!(%quest_id, removed, "encounter turned in");
    Ok(events)
}

/// Handles `RecordObjectDeath`: attributes a death of an owned object to
/// its instance, whatever killed it. Deaths of objects this runtime does not
/// own are left to ordinary kill tracking.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if a registry mutex is poisoned or
/// saving fails.
#[instrument(skip_all, fields(object_id = %command.object_id))]
pub async fn handle_object_death(
    command: &RecordObjectDeath,
    ctx: &EncounterContext,
) -> Result<KillAttribution, DomainError> {
    let typed = lock(&ctx.ownership, "ownership registry")?.forget(command.object_id);
    let Some(quest_id) = typed.or_else(|| owner_from_tags(&command.tags)) else {
        return Ok(KillAttribution::NotOwned);
    };

    let Some(player_id) = ctx.owner_of(quest_id).await else {
        debug!(%quest_id, "owned object died with no matching encounter");
        return Ok(KillAttribution::Orphaned { quest_id });
    };
    let _work = ctx.enter(player_id).await?;
    let mut record = ctx.load_record(player_id).await;
    let Some(instance) = record
        .active
        .as_mut()
        .filter(|active| active.id == quest_id && active.spawn_record().is_some())
    else {
        return Ok(KillAttribution::Orphaned { quest_id });
    };
    if !instance.composition.is_counted(&command.unit_type) {
        return Ok(KillAttribution::Uncounted { quest_id });
    }

    let completed = instance.record_kill(
        command.object_id,
        command.correlation_id,
        ctx.clock.as_ref(),
    )?;
    let (progress, total) = (instance.progress, instance.total_unit_count);
    ctx.save_record(player_id, &record).await?;

    ctx.notifier.notify(
        player_id,
        &Notice::Progress {
            quest_id,
            progress,
            total,
        },
    );
    if completed {
        ctx.notifier
            .notify(player_id, &Notice::ReadyToTurnIn { quest_id });
        info!(%quest_id, total, "encounter complete");
    }
    Ok(KillAttribution::Counted {
        quest_id,
        player_id,
        progress,
        total,
        completed,
    })
}

/// Handles `DisconnectPlayer`: closes the session and removes the live
/// group. The instance, its progress and its spawn location are kept.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if a registry mutex is poisoned or
/// saving fails.
#[instrument(skip_all, fields(player_id = %command.player_id))]
pub async fn handle_disconnect(
    command: &DisconnectPlayer,
    ctx: &EncounterContext,
) -> Result<Vec<EncounterEvent>, DomainError> {
    let player_id = command.player_id;
    lock(&ctx.sessions, "session registry")?.close(player_id);

    let _work = ctx.enter(player_id).await?;
    let mut record = ctx.load_record(player_id).await;
    let Some(instance) = record.active.as_mut() else {
        return Ok(Vec::new());
    };
    if instance.spawn_record().is_none() {
        return Ok(Vec::new());
    }
    let quest_id = instance.id;
    let removed = ctx.despawn(quest_id)?;
    instance.suspend(removed, command.correlation_id, ctx.clock.as_ref())?;
    let events = instance.take_uncommitted_events();
    ctx.save_record(player_id, &record).await?;

    info!(%quest_id, removed, "encounter suspended");
    Ok(events)
}

/// Handles `ReconnectPlayer`: opens the session and, for a spawned
/// instance, recreates the undefeated units that are no longer in the world
/// at the recorded location. Units still alive are kept and recorded.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if a registry mutex is poisoned or
/// saving fails.
#[instrument(skip_all, fields(player_id = %command.player_id))]
pub async fn handle_reconnect(
    command: &ReconnectPlayer,
    ctx: &EncounterContext,
) -> Result<Vec<EncounterEvent>, DomainError> {
    let player_id = command.player_id;
    lock(&ctx.sessions, "session registry")?.open(player_id);

    let _work = ctx.enter(player_id).await?;
    let mut record = ctx.load_record(player_id).await;
    let Some(instance) = record.active.as_mut() else {
        return Ok(Vec::new());
    };
    let quest_id = instance.id;
    lock(&ctx.sessions, "session registry")?.track(player_id, Some(quest_id));

    let Some(spawn) = instance.spawn_record().cloned() else {
        return Ok(Vec::new());
    };
    let remaining = instance.remaining();
    if remaining == 0 {
        return Ok(Vec::new());
    }
    let live = ctx.live_objects(quest_id)?;
    let present = live
        .iter()
        .filter(|info| instance.composition.is_counted(&info.unit_type))
        .count();
    let missing = remaining.saturating_sub(u32::try_from(present).unwrap_or(u32::MAX));
    if missing == 0 {
        debug!(%quest_id, present, "group still present, nothing to restore");
        return Ok(Vec::new());
    }

    let composition = instance.composition.remainder(missing);
    let outcome = ctx.spawn(quest_id, &composition, spawn.location, &spawn.dimension)?;
    let unit_count = outcome.object_ids.len();
    let mut object_ids: Vec<ObjectId> = live.into_iter().map(|info| info.id).collect();
    object_ids.extend(outcome.object_ids);
    instance.restore(object_ids, command.correlation_id, ctx.clock.as_ref())?;
    let events = instance.take_uncommitted_events();
    ctx.save_record(player_id, &record).await?;
    lock(&ctx.sessions, "session registry")?.defer(outcome.deferred);

    ctx.notifier.notify(
        player_id,
        &Notice::Restored {
            quest_id,
            unit_count,
        },
    );
    info!(%quest_id, unit_count, remaining, "encounter restored");
    Ok(events)
}

/// Decides whether damage to `object_id` proceeds. Only the burn class is
/// cancelled, and only for owned objects; falling, drowning and lava stay
/// active so owned objects cannot get stuck.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the ownership mutex is poisoned.
pub fn guard_damage(
    ctx: &EncounterContext,
    object_id: ObjectId,
    cause: DamageCause,
) -> Result<DamageVerdict, DomainError> {
    if !cause.is_burn() {
        return Ok(DamageVerdict::Allow);
    }
    let owned = lock(&ctx.ownership, "ownership registry")?.is_owned(ctx.world.as_ref(), object_id);
    Ok(if owned {
        DamageVerdict::Cancel
    } else {
        DamageVerdict::Allow
    })
}

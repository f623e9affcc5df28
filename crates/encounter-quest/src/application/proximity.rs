//! Proximity monitor.
//!
//! One scan runs per tick over every connected player holding an encounter.
//! It emits the navigation hint, starts the spawn sequence when the player
//! enters the trigger radius, and resumes sequences whose nearing delay has
//! elapsed. The delay is a scheduled resumption checked on later scans, not
//! a blocking wait. Creations deferred on one scan are retried at the start
//! of the next.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use encounter_core::error::DomainError;
use encounter_core::ids::{ObjectId, PlayerId, QuestId};
use encounter_core::notify::Notice;
use encounter_world::domain::navigation::derive_hint;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::application::context::{EncounterContext, lock};
use crate::application::sessions::SpawnGuard;

/// What one scan did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Connected players visited.
    pub players: usize,
    /// Navigation hints emitted.
    pub hints: usize,
    /// Instances whose spawn sequence started.
    pub triggered: Vec<QuestId>,
    /// Instances moved to spawned.
    pub spawned: Vec<QuestId>,
    /// Late objects attached to spawn records.
    pub attached: usize,
}

/// Runs one scan.
///
/// A failure for one player is logged and the scan moves on.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if a registry mutex is poisoned
/// while retrying deferred creations.
#[instrument(skip_all)]
pub async fn run_scan(ctx: &EncounterContext) -> Result<ScanReport, DomainError> {
    let mut report = ScanReport {
        attached: retry_deferred(ctx).await?,
        ..ScanReport::default()
    };
    let now = ctx.clock.now();

    for player_id in ctx.world.connected_players() {
        report.players += 1;
        if let Err(err) = scan_player(ctx, player_id, now, &mut report).await {
            warn!(%player_id, %err, "proximity scan failed for player");
        }
    }
    Ok(report)
}

async fn scan_player(
    ctx: &EncounterContext,
    player_id: PlayerId,
    now: DateTime<Utc>,
    report: &mut ScanReport,
) -> Result<(), DomainError> {
    let Some(pose) = ctx.world.player_pose(player_id) else {
        return Ok(());
    };
    let _work = ctx.enter(player_id).await?;
    let mut record = ctx.load_record(player_id).await;
    let Some(instance) = record.active.as_mut() else {
        lock(&ctx.sessions, "session registry")?.track(player_id, None);
        return Ok(());
    };
    let quest_id = instance.id;
    {
        let mut sessions = lock(&ctx.sessions, "session registry")?;
        sessions.open(player_id);
        sessions.track(player_id, Some(quest_id));
    }
    if pose.dimension != instance.dimension {
        return Ok(());
    }

    let hint = derive_hint(
        &pose,
        instance.navigation_target(),
        ctx.config.beacon_radius,
        ctx.config.beacon_period(),
        now,
    );
    ctx.notifier.notify(
        player_id,
        &Notice::Navigation {
            quest_id,
            arrow: hint.bearing.arrow(),
            distance: hint.distance,
            beacon_active: hint.beacon_active,
            beacon_lit: hint.beacon_lit,
        },
    );
    lock(&ctx.sessions, "session registry")?.cache_hint(player_id, hint);
    report.hints += 1;

    if !instance.is_pending() {
        return Ok(());
    }

    let guard = lock(&ctx.sessions, "session registry")?
        .guard(player_id)
        .cloned();
    if let Some(guard) = guard.filter(|g| g.quest_id == quest_id) {
        if ctx.clock.has_passed(guard.resume_at) {
            resume_spawn(ctx, guard, report).await?;
        }
        return Ok(());
    }

    if pose.position.horizontal_distance(&instance.zone.center) > ctx.config.trigger_radius {
        return Ok(());
    }
    let guard = SpawnGuard {
        quest_id,
        player_id,
        resume_at: now + ctx.config.nearing_delay(),
        correlation_id: Uuid::new_v4(),
    };
    let correlation_id = guard.correlation_id;
    if !lock(&ctx.sessions, "session registry")?.arm_guard(guard) {
        return Ok(());
    }
    instance.begin_spawn(pose.position, correlation_id, ctx.clock.as_ref())?;
    if let Err(err) = ctx.save_record(player_id, &record).await {
        lock(&ctx.sessions, "session registry")?.take_guard(player_id);
        return Err(err);
    }

    ctx.notifier
        .notify(player_id, &Notice::Nearing { quest_id });
    info!(%player_id, %quest_id, "encounter triggered");
    report.triggered.push(quest_id);
    Ok(())
}

/// Finishes a spawn sequence once its delay has elapsed. The guard is
/// checked against the current state first: the player must still be
/// connected and the instance must still be their active, pending one.
async fn resume_spawn(
    ctx: &EncounterContext,
    guard: SpawnGuard,
    report: &mut ScanReport,
) -> Result<(), DomainError> {
    let current = lock(&ctx.sessions, "session registry")?.take_guard(guard.player_id);
    if current.as_ref() != Some(&guard) {
        debug!(quest_id = %guard.quest_id, "spawn guard replaced while waiting");
        return Ok(());
    }

    let player_id = guard.player_id;
    let quest_id = guard.quest_id;
    let mut record = ctx.load_record(player_id).await;
    let Some(instance) = record
        .active
        .as_mut()
        .filter(|active| active.id == quest_id && active.is_pending())
    else {
        debug!(%quest_id, "encounter changed while waiting, spawn cancelled");
        return Ok(());
    };
    let pose = ctx
        .world
        .player_pose(player_id)
        .filter(|p| p.dimension == instance.dimension);
    let Some(pose) = pose else {
        debug!(%quest_id, "player left before spawn, spawn cancelled");
        return Ok(());
    };

    let point = ctx.spawn_point_near(&instance.dimension, pose.position)?;
    let outcome = ctx.spawn(quest_id, &instance.composition, point, &instance.dimension)?;
    if outcome.object_ids.is_empty() && outcome.deferred.is_empty() {
        warn!(%quest_id, "no unit could be created, encounter stays pending");
        return Ok(());
    }

    let unit_count = outcome.object_ids.len();
    instance.record_spawn(
        point,
        outcome.object_ids,
        guard.correlation_id,
        ctx.clock.as_ref(),
    )?;
    if let Err(err) = ctx.save_record(player_id, &record).await {
        // The unrecorded group would be duplicated by the next trigger.
        ctx.despawn(quest_id)?;
        return Err(err);
    }
    lock(&ctx.sessions, "session registry")?.defer(outcome.deferred);

    ctx.notifier.notify(
        player_id,
        &Notice::Spawned {
            quest_id,
            location: point,
            unit_count,
        },
    );
    info!(%player_id, %quest_id, unit_count, "encounter spawned");
    report.spawned.push(quest_id);
    Ok(())
}

/// Makes the single retry of creations deferred on the previous step and
/// attaches the results to their instance when it is still the same spawned
/// encounter. Objects that cannot be attached stay owned and are caught by a
/// later despawn or sweep.
async fn retry_deferred(ctx: &EncounterContext) -> Result<usize, DomainError> {
    let deferred = lock(&ctx.sessions, "session registry")?.take_deferred();
    if deferred.is_empty() {
        return Ok(0);
    }
    let created = {
        let mut ownership = lock(&ctx.ownership, "ownership registry")?;
        ctx.spawner
            .retry_deferred(ctx.world.as_ref(), &mut ownership, deferred)
    };

    let mut by_quest: BTreeMap<QuestId, Vec<ObjectId>> = BTreeMap::new();
    for (quest_id, object_id) in created {
        by_quest.entry(quest_id).or_default().push(object_id);
    }

    let mut attached = 0;
    for (quest_id, object_ids) in by_quest {
        match attach_late(ctx, quest_id, object_ids).await {
            Ok(count) => attached += count,
            Err(err) => warn!(%quest_id, %err, "late objects could not be attached"),
        }
    }
    Ok(attached)
}

async fn attach_late(
    ctx: &EncounterContext,
    quest_id: QuestId,
    object_ids: Vec<ObjectId>,
) -> Result<usize, DomainError> {
    let Some(player_id) = ctx.owner_of(quest_id).await else {
        debug!(%quest_id, "late objects have no encounter, leaving them for the sweep");
        return Ok(0);
    };
    let _work = ctx.enter(player_id).await?;
    let mut record = ctx.load_record(player_id).await;
    let Some(instance) = record
        .active
        .as_mut()
        .filter(|active| active.id == quest_id && active.spawn_record().is_some())
    else {
        return Ok(0);
    };
    let count = object_ids.len();
    instance.attach_objects(object_ids, Uuid::new_v4(), ctx.clock.as_ref())?;
    ctx.save_record(player_id, &record).await?;
    debug!(%quest_id, count, "late objects attached");
    Ok(count)
}

//! Operator commands: force completion, summon a test group, clear an area.

use encounter_core::encounter::Composition;
use encounter_core::error::DomainError;
use encounter_core::geometry::Position;
use encounter_core::ids::{DimensionId, ObjectId, PlayerId, QuestId};
use encounter_core::notify::Notice;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::application::context::{EncounterContext, lock};
use crate::domain::commands::ForceComplete;
use crate::domain::events::EncounterEvent;

/// A group summoned next to a player for testing. It belongs to no instance,
/// so the orphan reaper removes whatever is left of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestGroup {
    /// Owner id written onto the group's tags.
    pub quest_id: QuestId,
    /// Where the group was placed.
    pub location: Position,
    /// Objects created immediately.
    pub object_ids: Vec<ObjectId>,
    /// Creations queued for retry.
    pub deferred: usize,
}

/// Marks every unit of the player's spawned encounter defeated.
///
/// # Errors
///
/// Returns `DomainError::NoActiveEncounter` if the slot is empty,
/// `DomainError::InvalidTransition` if the encounter is still pending, and
/// `DomainError::Infrastructure` if saving fails.
#[instrument(skip_all, fields(player_id = %command.player_id))]
pub async fn force_complete(
    command: &ForceComplete,
    ctx: &EncounterContext,
) -> Result<Vec<EncounterEvent>, DomainError> {
    let player_id = command.player_id;
    let _work = ctx.enter(player_id).await?;
    let mut record = ctx.load_record(player_id).await;
    let instance = record
        .active
        .as_mut()
        .ok_or(DomainError::NoActiveEncounter(player_id))?;
    instance.force_complete(command.correlation_id, ctx.clock.as_ref())?;
    let quest_id = instance.id;
    let events = instance.take_uncommitted_events();
    ctx.save_record(player_id, &record).await?;

    ctx.notifier
        .notify(player_id, &Notice::ReadyToTurnIn { quest_id });
    warn!(%quest_id, "encounter force-completed by operator");
    Ok(events)
}

/// Summons `composition` next to a connected player under a fresh owner id.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an unusable composition or an
/// offline player, and `DomainError::Infrastructure` if a registry mutex is
/// poisoned.
#[instrument(skip_all, fields(player_id = %player_id))]
pub fn force_spawn_test_group(
    ctx: &EncounterContext,
    player_id: PlayerId,
    composition: &Composition,
) -> Result<TestGroup, DomainError> {
    composition.validate()?;
    let pose = ctx
        .world
        .player_pose(player_id)
        .ok_or_else(|| DomainError::Validation(format!("player {player_id} is not connected")))?;

    let location = ctx.spawn_point_near(&pose.dimension, pose.position)?;
    let quest_id = QuestId::new();
    let outcome = ctx.spawn(quest_id, composition, location, &pose.dimension)?;
    let deferred = outcome.deferred.len();
    lock(&ctx.sessions, "session registry")?.defer(outcome.deferred);

    info!(%quest_id, created = outcome.object_ids.len(), deferred, "test group summoned");
    Ok(TestGroup {
        quest_id,
        location,
        object_ids: outcome.object_ids,
        deferred,
    })
}

/// Removes every owned object within `radius` blocks (horizontal) of
/// `center`, whatever instance it belongs to. Quest state is untouched.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a radius that is not a positive
/// finite number and `DomainError::Infrastructure` if the ownership mutex is
/// poisoned.
#[instrument(skip_all, fields(dimension = %dimension, radius))]
pub fn force_despawn_radius(
    ctx: &EncounterContext,
    dimension: &DimensionId,
    center: Position,
    radius: f64,
) -> Result<usize, DomainError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(DomainError::Validation(format!(
            "radius must be a positive number, got {radius}"
        )));
    }
    let removed = {
        let mut ownership = lock(&ctx.ownership, "ownership registry")?;
        let world = ctx.world.as_ref();
        ctx.spawner
            .despawn_within(world, &mut ownership, dimension, center, radius)
    };
    info!(removed, "owned objects cleared by operator");
    Ok(removed)
}

/// Number of live objects owned by `quest_id`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the ownership mutex is poisoned.
pub fn count_live(ctx: &EncounterContext, quest_id: QuestId) -> Result<usize, DomainError> {
    ctx.count_live(quest_id)
}

#[cfg(test)]
mod tests {
    use encounter_core::encounter::UnitGroup;
    use encounter_core::world::WorldSurface;
    use uuid::Uuid;

    use super::*;
    use crate::application::fixtures::Fixture;

    fn zombies(count: u32) -> Composition {
        Composition(vec![UnitGroup::new("zombie", count)])
    }

    fn force(player_id: PlayerId) -> ForceComplete {
        ForceComplete {
            correlation_id: Uuid::new_v4(),
            player_id,
        }
    }

    #[tokio::test]
    async fn test_force_complete_marks_spawned_encounter_ready() {
        // Arrange
        let fx = Fixture::new();
        let player = PlayerId::new();
        let quest = fx.spawned_encounter(player, zombies(4)).await;

        // Act
        let events = force_complete(&force(player), &fx.ctx).await.unwrap();

        // Assert
        assert_eq!(events.len(), 1);
        let instance = fx.active(player).await.unwrap();
        assert!(instance.is_complete());
        assert_eq!(instance.progress, 4);
        assert!(
            fx.notifier
                .alerts()
                .contains(&Notice::ReadyToTurnIn { quest_id: quest })
        );
    }

    #[tokio::test]
    async fn test_force_complete_rejects_pending_encounter() {
        let fx = Fixture::new();
        let player = PlayerId::new();
        fx.pending_encounter(player, zombies(2)).await;

        let result = force_complete(&force(player), &fx.ctx).await;

        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition { action: "complete", .. })
        ));
    }

    #[tokio::test]
    async fn test_force_complete_without_encounter_fails() {
        let fx = Fixture::new();

        let result = force_complete(&force(PlayerId::new()), &fx.ctx).await;

        assert!(matches!(result, Err(DomainError::NoActiveEncounter(_))));
    }

    #[test]
    fn test_test_group_spawns_next_to_player() {
        // Arrange
        let fx = Fixture::new();
        let player = PlayerId::new();
        let position = Position::new(40.5, 64.0, -20.5);
        fx.place(player, position);

        // Act
        let group = force_spawn_test_group(&fx.ctx, player, &zombies(3)).unwrap();

        // Assert
        assert_eq!(group.object_ids.len(), 3);
        assert_eq!(group.deferred, 0);
        assert!(position.horizontal_distance(&group.location) <= 22.0 + 1e-6);
        assert_eq!(count_live(&fx.ctx, group.quest_id).unwrap(), 3);
    }

    #[test]
    fn test_test_group_requires_connected_player() {
        let fx = Fixture::new();

        let result = force_spawn_test_group(&fx.ctx, PlayerId::new(), &zombies(1));

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(fx.world.object_count(), 0);
    }

    #[test]
    fn test_test_group_rejects_empty_composition() {
        let fx = Fixture::new();
        let player = PlayerId::new();
        fx.place(player, Position::new(0.5, 64.0, 0.5));

        let result = force_spawn_test_group(&fx.ctx, player, &Composition(Vec::new()));

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_despawn_radius_only_touches_owned_objects_in_range() {
        // Arrange
        let fx = Fixture::new();
        let overworld = DimensionId::new("overworld");
        let near = PlayerId::new();
        let far = PlayerId::new();
        fx.place(near, Position::new(0.5, 64.0, 0.5));
        fx.place(far, Position::new(500.5, 64.0, 500.5));
        let kept = force_spawn_test_group(&fx.ctx, far, &zombies(2)).unwrap();
        force_spawn_test_group(&fx.ctx, near, &zombies(3)).unwrap();
        fx.world
            .create_object(&overworld, "cow", Position::new(1.5, 64.0, 1.5), None)
            .unwrap();

        let center = Position::new(0.5, 64.0, 0.5);

        // Act
        let removed = force_despawn_radius(&fx.ctx, &overworld, center, 50.0).unwrap();

        // Assert
        assert_eq!(removed, 3);
        assert_eq!(count_live(&fx.ctx, kept.quest_id).unwrap(), 2);
        assert_eq!(fx.world.object_count(), 3);
    }

    #[test]
    fn test_despawn_radius_rejects_non_positive_radius() {
        let fx = Fixture::new();
        let overworld = DimensionId::new("overworld");

        for radius in [0.0, -5.0, f64::NAN] {
            let result = force_despawn_radius(&fx.ctx, &overworld, Position::default(), radius);
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }
    }
}

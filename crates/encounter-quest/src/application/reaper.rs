//! Orphan reaper.
//!
//! Removes owned objects left behind by a crash or an incomplete cleanup.
//! It only ever removes world objects; quest state is never touched. The
//! sweep holds the work gate exclusively, so no spawn or turn-in can land
//! between reading the documents and removing objects.

use std::collections::HashSet;

use encounter_core::error::DomainError;
use encounter_core::ids::QuestId;
use encounter_world::domain::ownership::SYSTEM_TAG;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::application::context::{EncounterContext, lock};

/// Outcome of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Owned objects examined.
    pub inspected: usize,
    /// Orphans removed.
    pub removed: usize,
    /// Objects kept because a spawned instance claims them.
    pub kept: usize,
}

/// Removes every owned object whose instance is not some player's active,
/// spawned encounter. Unreadable player records count as "no data".
///
/// # Errors
///
/// Returns the store's error if players cannot be enumerated; nothing is
/// removed in that case.
#[instrument(skip_all)]
pub async fn sweep(ctx: &EncounterContext) -> Result<SweepReport, DomainError> {
    let _exclusive = ctx.exclusive().await;
    let players = ctx.store.list_players().await?;
    let mut live: HashSet<QuestId> = HashSet::new();
    for player_id in players {
        let active = ctx.load_record(player_id).await.active;
        if let Some(active) = active.filter(|instance| instance.spawn_record().is_some()) {
            live.insert(active.id);
        }
    }

    let world = ctx.world.as_ref();
    let mut report = SweepReport::default();
    let mut ownership = lock(&ctx.ownership, "ownership registry")?;
    for info in world.objects_with_tag(SYSTEM_TAG) {
        report.inspected += 1;
        match ownership.adopt(world, info.id) {
            Some(owner) if live.contains(&owner) => report.kept += 1,
            owner => {
                if world.remove_object(info.id) {
                    report.removed += 1;
                }
                ownership.forget(info.id);
                debug!(object_id = %info.id, ?owner, "removed orphan");
            }
        }
    }

    info!(
        inspected = report.inspected,
        removed = report.removed,
        kept = report.kept,
        "orphan sweep finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use encounter_core::encounter::{Composition, UnitGroup};
    use encounter_core::geometry::Position;
    use encounter_core::ids::{DimensionId, ObjectId, PlayerId};
    use encounter_core::world::{ObjectInfo, WorldSurface};
    use encounter_world::domain::ownership::quest_tag;

    use super::*;
    use crate::application::fixtures::Fixture;

    fn leftover(quest_id: QuestId) -> ObjectInfo {
        ObjectInfo {
            id: ObjectId::new(),
            unit_type: "zombie".to_owned(),
            dimension: DimensionId::new("overworld"),
            position: Position::new(5.0, 64.0, 5.0),
            tags: vec![SYSTEM_TAG.to_owned(), quest_tag(quest_id)],
        }
    }

    #[tokio::test]
    async fn test_sweep_removes_orphans_and_keeps_live_groups() {
        // Arrange
        let fx = Fixture::new();
        let player = PlayerId::new();
        let quest = fx
            .spawned_encounter(player, Composition(vec![UnitGroup::new("zombie", 3)]))
            .await;
        let orphan = leftover(QuestId::new());
        fx.world.insert_object(orphan.clone());

        // Act
        let report = sweep(&fx.ctx).await.unwrap();

        // Assert
        let expected = SweepReport {
            inspected: 4,
            removed: 1,
            kept: 3,
        };
        assert_eq!(report, expected);
        assert!(fx.world.object(orphan.id).is_none());
        assert_eq!(fx.ctx.count_live(quest).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_sweep_removes_objects_of_pending_instance() {
        let fx = Fixture::new();
        let player = PlayerId::new();
        let instance = fx
            .pending_encounter(player, Composition(vec![UnitGroup::new("zombie", 2)]))
            .await;
        fx.world.insert_object(leftover(instance.id));

        let report = sweep(&fx.ctx).await.unwrap();

        assert_eq!(report.removed, 1);
        assert_eq!(fx.world.object_count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_ignores_untagged_objects() {
        let fx = Fixture::new();
        let overworld = DimensionId::new("overworld");
        fx.world
            .create_object(&overworld, "cow", Position::default(), None)
            .unwrap();

        let report = sweep(&fx.ctx).await.unwrap();

        assert_eq!(report.inspected, 0);
        assert_eq!(fx.world.object_count(), 1);
    }

    #[tokio::test]
    async fn test_sweep_aborts_when_players_cannot_be_listed() {
        let fx = Fixture::with_failing_store();
        fx.world.insert_object(leftover(QuestId::new()));

        let result = sweep(&fx.ctx).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
        assert_eq!(fx.world.object_count(), 1);
    }
}

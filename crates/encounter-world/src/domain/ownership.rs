//! Ownership registry.
//!
//! Every object created for an encounter carries two string tags on the host
//! side: [`SYSTEM_TAG`], marking it as belonging to this runtime, and a
//! quest tag naming the owning instance. The tags are the interop surface
//! with the host; lookups go through a typed `object → quest` map kept in
//! lockstep, and only fall back to parsing tags for objects this process did
//! not create (left over from an earlier run).

use std::collections::{HashMap, HashSet};

use encounter_core::ids::{ObjectId, QuestId};
use encounter_core::world::WorldSurface;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Tag carried by every object this runtime creates.
pub const SYSTEM_TAG: &str = "encounter_owned";

/// Prefix of the per-instance tag; the instance id follows it.
pub const QUEST_TAG_PREFIX: &str = "encounter_quest:";

/// The host tag naming `quest_id` as owner.
#[must_use]
pub fn quest_tag(quest_id: QuestId) -> String {
    format!("{QUEST_TAG_PREFIX}{}", quest_id.0.hyphenated())
}

/// Parses a quest tag. The remainder must be a complete hyphenated id, so a
/// truncated or extended tag never matches.
#[must_use]
pub fn parse_quest_tag(tag: &str) -> Option<QuestId> {
    let raw = tag.strip_prefix(QUEST_TAG_PREFIX)?;
    if raw.len() != uuid::fmt::Hyphenated::LENGTH {
        return None;
    }
    Uuid::parse_str(raw).ok().map(QuestId)
}

/// Resolves the owner from a full tag list. Requires the system tag and
/// exactly one distinct quest tag.
#[must_use]
pub fn owner_from_tags(tags: &[String]) -> Option<QuestId> {
    if !tags.iter().any(|t| t == SYSTEM_TAG) {
        return None;
    }
    let owners: HashSet<QuestId> = tags.iter().filter_map(|t| parse_quest_tag(t)).collect();
    match owners.len() {
        1 => owners.into_iter().next(),
        0 => None,
        n => {
            warn!(owners = n, "object carries more than one quest tag");
            None
        }
    }
}

/// Tagging failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OwnershipError {
    /// The object already belongs to a different instance.
    #[error("object {object} already belongs to encounter {owner}")]
    AlreadyOwned {
        /// The object.
        object: ObjectId,
        /// Its existing owner.
        owner: QuestId,
    },

    /// The object disappeared before it could be tagged.
    #[error("object {0} no longer exists")]
    ObjectGone(ObjectId),
}

/// Typed owner map backing ownership lookups.
#[derive(Debug, Default)]
pub struct OwnershipRegistry {
    owners: HashMap<ObjectId, QuestId>,
    by_quest: HashMap<QuestId, HashSet<ObjectId>>,
}

impl OwnershipRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `object` as owned by `quest_id`, on the host and in the typed
    /// map. Tagging an object already owned by the same instance is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `OwnershipError::AlreadyOwned` if another instance owns the
    /// object, `OwnershipError::ObjectGone` if it no longer exists.
    pub fn tag(
        &mut self,
        world: &dyn WorldSurface,
        object: ObjectId,
        quest_id: QuestId,
    ) -> Result<(), OwnershipError> {
        match self.owner_quest_id(world, object) {
            Some(owner) if owner == quest_id => {
                self.record(object, quest_id);
                return Ok(());
            }
            Some(owner) => return Err(OwnershipError::AlreadyOwned { object, owner }),
            None => {}
        }

        if !world.add_tag(object, SYSTEM_TAG) || !world.add_tag(object, &quest_tag(quest_id)) {
            return Err(OwnershipError::ObjectGone(object));
        }
        self.record(object, quest_id);
        Ok(())
    }

    /// Whether the object belongs to this runtime.
    #[must_use]
    pub fn is_owned(&self, world: &dyn WorldSurface, object: ObjectId) -> bool {
        self.owners.contains_key(&object)
            || world
                .tags(object)
                .is_some_and(|tags| tags.iter().any(|t| t == SYSTEM_TAG))
    }

    /// The instance owning `object`, if any.
    #[must_use]
    pub fn owner_quest_id(&self, world: &dyn WorldSurface, object: ObjectId) -> Option<QuestId> {
        if let Some(owner) = self.owners.get(&object) {
            return Some(*owner);
        }
        world.tags(object).and_then(|tags| owner_from_tags(&tags))
    }

    /// Resolves the owner of an object not created by this process and
    /// records it in the typed map.
    pub fn adopt(&mut self, world: &dyn WorldSurface, object: ObjectId) -> Option<QuestId> {
        let owner = self.owner_quest_id(world, object)?;
        self.record(object, owner);
        Some(owner)
    }

    /// Objects known to belong to `quest_id`.
    #[must_use]
    pub fn objects_of(&self, quest_id: QuestId) -> Vec<ObjectId> {
        self.by_quest
            .get(&quest_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Drops the typed entry for `object`, returning its former owner.
    pub fn forget(&mut self, object: ObjectId) -> Option<QuestId> {
        let owner = self.owners.remove(&object)?;
        if let Some(set) = self.by_quest.get_mut(&owner) {
            set.remove(&object);
            if set.is_empty() {
                self.by_quest.remove(&owner);
            }
        }
        Some(owner)
    }

    /// Number of objects in the typed map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether the typed map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    fn record(&mut self, object: ObjectId, quest_id: QuestId) {
        self.owners.insert(object, quest_id);
        self.by_quest.entry(quest_id).or_default().insert(object);
    }
}

#[cfg(test)]
mod tests {
    use encounter_core::geometry::Position;
    use encounter_core::ids::DimensionId;

    use super::*;
    use crate::infrastructure::grid_world::GridWorld;

    fn spawn_plain(world: &GridWorld) -> ObjectId {
        world
            .create_object(
                &DimensionId::new("overworld"),
                "skeleton",
                Position::new(0.5, 64.0, 0.5),
                None,
            )
            .unwrap()
    }

    #[test]
    fn test_tag_round_trips_owner() {
        // Arrange
        let world = GridWorld::default();
        let mut registry = OwnershipRegistry::new();
        let object = spawn_plain(&world);
        let quest = QuestId::new();

        // Act
        registry.tag(&world, object, quest).unwrap();

        // Assert
        assert!(registry.is_owned(&world, object));
        assert_eq!(registry.owner_quest_id(&world, object), Some(quest));
        let tags = world.tags(object).unwrap();
        assert!(tags.contains(&SYSTEM_TAG.to_owned()));
        assert!(tags.contains(&quest_tag(quest)));
    }

    #[test]
    fn test_second_owner_is_rejected() {
        let world = GridWorld::default();
        let mut registry = OwnershipRegistry::new();
        let object = spawn_plain(&world);
        let first = QuestId::new();
        registry.tag(&world, object, first).unwrap();

        let result = registry.tag(&world, object, QuestId::new());

        assert_eq!(
            result,
            Err(OwnershipError::AlreadyOwned {
                object,
                owner: first
            })
        );
        let quest_tags = world
            .tags(object)
            .unwrap()
            .into_iter()
            .filter(|t| t.starts_with(QUEST_TAG_PREFIX))
            .count();
        assert_eq!(quest_tags, 1);
    }

    #[test]
    fn test_tagging_same_owner_twice_is_noop() {
        let world = GridWorld::default();
        let mut registry = OwnershipRegistry::new();
        let object = spawn_plain(&world);
        let quest = QuestId::new();

        registry.tag(&world, object, quest).unwrap();
        registry.tag(&world, object, quest).unwrap();

        assert_eq!(registry.objects_of(quest), vec![object]);
    }

    #[test]
    fn test_tagging_missing_object_fails() {
        let world = GridWorld::default();
        let mut registry = OwnershipRegistry::new();

        let result = registry.tag(&world, ObjectId::new(), QuestId::new());

        assert!(matches!(result, Err(OwnershipError::ObjectGone(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_owner_resolves_from_host_tags_after_restart() {
        // Arrange: tagged by one registry, looked up by a fresh one.
        let world = GridWorld::default();
        let object = spawn_plain(&world);
        let quest = QuestId::new();
        OwnershipRegistry::new().tag(&world, object, quest).unwrap();
        let mut fresh = OwnershipRegistry::new();

        // Act
        let adopted = fresh.adopt(&world, object);

        // Assert
        assert_eq!(adopted, Some(quest));
        assert_eq!(fresh.objects_of(quest), vec![object]);
    }

    #[test]
    fn test_parse_quest_tag_requires_exact_id() {
        let quest = QuestId::new();
        let tag = quest_tag(quest);

        assert_eq!(parse_quest_tag(&tag), Some(quest));
        assert_eq!(parse_quest_tag(&tag[..tag.len() - 4]), None);
        assert_eq!(parse_quest_tag(&format!("{tag}0")), None);
        assert_eq!(parse_quest_tag("encounter_quest:"), None);
        assert_eq!(parse_quest_tag(&quest.to_string()), None);
    }

    #[test]
    fn test_owner_from_tags_requires_system_tag() {
        let quest = QuestId::new();

        assert_eq!(owner_from_tags(&[quest_tag(quest)]), None);
        assert_eq!(
            owner_from_tags(&[SYSTEM_TAG.to_owned(), quest_tag(quest)]),
            Some(quest)
        );
    }

    #[test]
    fn test_owner_from_tags_rejects_two_owners() {
        let tags = vec![
            SYSTEM_TAG.to_owned(),
            quest_tag(QuestId::new()),
            quest_tag(QuestId::new()),
        ];
        assert_eq!(owner_from_tags(&tags), None);
    }

    #[test]
    fn test_forget_removes_both_indexes() {
        let world = GridWorld::default();
        let mut registry = OwnershipRegistry::new();
        let object = spawn_plain(&world);
        let quest = QuestId::new();
        registry.tag(&world, object, quest).unwrap();

        assert_eq!(registry.forget(object), Some(quest));
        assert!(registry.objects_of(quest).is_empty());
        assert_eq!(registry.forget(object), None);
    }
}

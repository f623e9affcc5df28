//! Per-player session registry owned by the proximity monitor.
//!
//! Sessions live in an arena indexed by player and by tracked instance. A
//! session holds the in-flight spawn guard and the last navigation hint for
//! its player; closing the session on disconnect drops both.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use encounter_core::ids::{PlayerId, QuestId};
use encounter_world::application::spawner::DeferredCreate;
use encounter_world::domain::navigation::NavigationHint;
use uuid::Uuid;

/// The `Spawning` sub-state of a pending instance. It carries what the
/// resumption needs to check that nothing changed while it waited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnGuard {
    /// The instance being spawned; it must still be the player's active,
    /// pending instance at resume time.
    pub quest_id: QuestId,
    /// The player who triggered it.
    pub player_id: PlayerId,
    /// Earliest time the spawn may resume.
    pub resume_at: DateTime<Utc>,
    /// Correlation id shared by the trigger and spawn events.
    pub correlation_id: Uuid,
}

/// State kept for one connected player.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    /// The player.
    pub player_id: PlayerId,
    /// The player's active instance, if known.
    pub quest_id: Option<QuestId>,
    /// In-flight spawn sequence, if any.
    pub spawn_guard: Option<SpawnGuard>,
    /// Hint derived on the last scan.
    pub last_hint: Option<NavigationHint>,
}

/// Stable handle into the session arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey(usize);

/// Arena of player sessions plus the deferred creations awaiting their retry.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    slots: Vec<Option<PlayerSession>>,
    free: Vec<usize>,
    by_player: HashMap<PlayerId, SessionKey>,
    by_quest: HashMap<QuestId, SessionKey>,
    deferred: Vec<DeferredCreate>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session for `player_id`, or returns the existing one.
    pub fn open(&mut self, player_id: PlayerId) -> SessionKey {
        if let Some(key) = self.by_player.get(&player_id) {
            return *key;
        }
        let session = PlayerSession {
            player_id,
            quest_id: None,
            spawn_guard: None,
            last_hint: None,
        };
        let key = if let Some(index) = self.free.pop() {
            self.slots[index] = Some(session);
            SessionKey(index)
        } else {
            self.slots.push(Some(session));
            SessionKey(self.slots.len() - 1)
        };
        self.by_player.insert(player_id, key);
        key
    }

    /// Tears down the player's session, dropping its guard, hint and any
    /// deferred creations for its instance.
    pub fn close(&mut self, player_id: PlayerId) -> Option<PlayerSession> {
        let key = self.by_player.remove(&player_id)?;
        let session = self.slots.get_mut(key.0)?.take()?;
        self.free.push(key.0);
        if let Some(quest_id) = session.quest_id {
            self.by_quest.remove(&quest_id);
            self.deferred.retain(|request| request.quest_id != quest_id);
        }
        Some(session)
    }

    /// The player's session.
    #[must_use]
    pub fn get(&self, player_id: PlayerId) -> Option<&PlayerSession> {
        let key = self.by_player.get(&player_id)?;
        self.slots.get(key.0)?.as_ref()
    }

    fn get_mut(&mut self, player_id: PlayerId) -> Option<&mut PlayerSession> {
        let key = self.by_player.get(&player_id)?;
        self.slots.get_mut(key.0)?.as_mut()
    }

    /// Records which instance the player's session tracks. Switching to a
    /// different instance drops the old guard and hint. No-op without a
    /// session.
    pub fn track(&mut self, player_id: PlayerId, quest_id: Option<QuestId>) {
        let Some(key) = self.by_player.get(&player_id).copied() else {
            return;
        };
        let Some(session) = self.slots.get_mut(key.0).and_then(Option::as_mut) else {
            return;
        };
        if session.quest_id == quest_id {
            return;
        }
        if let Some(old) = session.quest_id.take() {
            self.by_quest.remove(&old);
        }
        session.spawn_guard = None;
        session.last_hint = None;
        session.quest_id = quest_id;
        if let Some(quest_id) = quest_id {
            self.by_quest.insert(quest_id, key);
        }
    }

    /// The connected player tracking `quest_id`.
    #[must_use]
    pub fn player_for(&self, quest_id: QuestId) -> Option<PlayerId> {
        let key = self.by_quest.get(&quest_id)?;
        self.slots.get(key.0)?.as_ref().map(|s| s.player_id)
    }

    /// Stops tracking an instance that was turned in or abandoned.
    pub fn clear_quest(&mut self, quest_id: QuestId) {
        let session = self
            .by_quest
            .remove(&quest_id)
            .and_then(|key| self.slots.get_mut(key.0))
            .and_then(Option::as_mut);
        if let Some(session) = session {
            session.quest_id = None;
            session.spawn_guard = None;
            session.last_hint = None;
        }
        self.deferred.retain(|request| request.quest_id != quest_id);
    }

    /// Arms a spawn guard. Refused when the player has no session or a
    /// sequence for the same instance is already in flight; a guard for a
    /// different instance is replaced.
    pub fn arm_guard(&mut self, guard: SpawnGuard) -> bool {
        let Some(session) = self.get_mut(guard.player_id) else {
            return false;
        };
        if session
            .spawn_guard
            .as_ref()
            .is_some_and(|current| current.quest_id == guard.quest_id)
        {
            return false;
        }
        session.spawn_guard = Some(guard);
        true
    }

    /// The player's in-flight guard.
    #[must_use]
    pub fn guard(&self, player_id: PlayerId) -> Option<&SpawnGuard> {
        self.get(player_id)?.spawn_guard.as_ref()
    }

    /// Removes and returns the player's guard.
    pub fn take_guard(&mut self, player_id: PlayerId) -> Option<SpawnGuard> {
        self.get_mut(player_id)?.spawn_guard.take()
    }

    /// Whether a spawn sequence for `quest_id` is in flight.
    #[must_use]
    pub fn is_spawning(&self, quest_id: QuestId) -> bool {
        self.player_for(quest_id)
            .and_then(|player| self.guard(player))
            .is_some_and(|guard| guard.quest_id == quest_id)
    }

    /// Caches the hint derived for the player this cycle.
    pub fn cache_hint(&mut self, player_id: PlayerId, hint: NavigationHint) {
        if let Some(session) = self.get_mut(player_id) {
            session.last_hint = Some(hint);
        }
    }

    /// The last hint derived for the player.
    #[must_use]
    pub fn last_hint(&self, player_id: PlayerId) -> Option<&NavigationHint> {
        self.get(player_id)?.last_hint.as_ref()
    }

    /// Queues creations for their retry on the next scheduling step.
    pub fn defer(&mut self, requests: Vec<DeferredCreate>) {
        self.deferred.extend(requests);
    }

    /// Drains the queued creations.
    pub fn take_deferred(&mut self) -> Vec<DeferredCreate> {
        std::mem::take(&mut self.deferred)
    }

    /// Number of open sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_player.len()
    }

    /// Whether no session is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_player.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use encounter_core::geometry::Position;
    use encounter_core::ids::DimensionId;

    use super::*;

    fn guard(player_id: PlayerId, quest_id: QuestId) -> SpawnGuard {
        SpawnGuard {
            quest_id,
            player_id,
            resume_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            correlation_id: Uuid::new_v4(),
        }
    }

    fn deferred(quest_id: QuestId) -> DeferredCreate {
        DeferredCreate {
            quest_id,
            dimension: DimensionId::new("overworld"),
            unit_type: "zombie".to_owned(),
            name_override: None,
            position: Position::default(),
        }
    }

    #[test]
    fn test_open_is_idempotent_and_close_reuses_slot() {
        // Arrange
        let mut sessions = SessionRegistry::new();
        let first = PlayerId::new();
        let second = PlayerId::new();

        // Act
        let key = sessions.open(first);
        let again = sessions.open(first);
        sessions.close(first);
        let reused = sessions.open(second);

        // Assert
        assert_eq!(key, again);
        assert_eq!(key, reused);
        assert_eq!(sessions.len(), 1);
        assert!(sessions.get(first).is_none());
    }

    #[test]
    fn test_track_indexes_quest_to_player() {
        let mut sessions = SessionRegistry::new();
        let player = PlayerId::new();
        let quest = QuestId::new();
        sessions.open(player);

        sessions.track(player, Some(quest));

        assert_eq!(sessions.player_for(quest), Some(player));
        sessions.track(player, None);
        assert_eq!(sessions.player_for(quest), None);
    }

    #[test]
    fn test_track_without_session_is_ignored() {
        let mut sessions = SessionRegistry::new();
        let quest = QuestId::new();

        sessions.track(PlayerId::new(), Some(quest));

        assert!(sessions.is_empty());
        assert_eq!(sessions.player_for(quest), None);
    }

    #[test]
    fn test_second_guard_for_same_instance_is_refused() {
        let mut sessions = SessionRegistry::new();
        let player = PlayerId::new();
        let quest = QuestId::new();
        sessions.open(player);
        sessions.track(player, Some(quest));

        assert!(sessions.arm_guard(guard(player, quest)));
        assert!(!sessions.arm_guard(guard(player, quest)));
        assert!(sessions.is_spawning(quest));
    }

    #[test]
    fn test_guard_requires_session() {
        let mut sessions = SessionRegistry::new();

        assert!(!sessions.arm_guard(guard(PlayerId::new(), QuestId::new())));
    }

    #[test]
    fn test_close_drops_guard_and_deferred_work() {
        // Arrange
        let mut sessions = SessionRegistry::new();
        let player = PlayerId::new();
        let quest = QuestId::new();
        let other = QuestId::new();
        sessions.open(player);
        sessions.track(player, Some(quest));
        sessions.arm_guard(guard(player, quest));
        sessions.defer(vec![deferred(quest), deferred(other)]);

        // Act
        let closed = sessions.close(player).unwrap();

        // Assert
        assert!(closed.spawn_guard.is_some());
        assert!(!sessions.is_spawning(quest));
        let left = sessions.take_deferred();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].quest_id, other);
    }

    #[test]
    fn test_clear_quest_keeps_session_open() {
        let mut sessions = SessionRegistry::new();
        let player = PlayerId::new();
        let quest = QuestId::new();
        sessions.open(player);
        sessions.track(player, Some(quest));
        sessions.arm_guard(guard(player, quest));

        sessions.clear_quest(quest);

        let session = sessions.get(player).unwrap();
        assert!(session.quest_id.is_none());
        assert!(session.spawn_guard.is_none());
        assert_eq!(sessions.player_for(quest), None);
    }

    #[test]
    fn test_switching_instance_drops_old_guard() {
        let mut sessions = SessionRegistry::new();
        let player = PlayerId::new();
        let old = QuestId::new();
        sessions.open(player);
        sessions.track(player, Some(old));
        sessions.arm_guard(guard(player, old));

        sessions.track(player, Some(QuestId::new()));

        assert!(sessions.guard(player).is_none());
        assert_eq!(sessions.player_for(old), None);
    }
}

//! Aggregate root for encounter instances.

use encounter_core::aggregate::AggregateRoot;
use encounter_core::clock::Clock;
use encounter_core::encounter::{Composition, Tier};
use encounter_core::error::DomainError;
use encounter_core::event::EventMetadata;
use encounter_core::geometry::{Position, RegionCoord};
use encounter_core::ids::{DimensionId, ObjectId, PlayerId, QuestId};
use encounter_world::domain::zone::Zone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::{
    EncounterAbandoned, EncounterAccepted, EncounterCompleted, EncounterEvent, EncounterEventKind,
    EncounterRestored, EncounterSpawned, EncounterSuspended, EncounterTurnedIn, ObjectsAttached,
    SpawnStarted, UnitDefeated,
};

/// The realised outcome of triggering an encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRecord {
    /// Where the group was placed. Reconnect restores the group here.
    pub location: Position,
    /// Dimension the group lives in.
    pub dimension: DimensionId,
    /// Region containing `location`.
    pub region: RegionCoord,
    /// Objects believed alive. Emptied when the group is suspended.
    pub object_ids: Vec<ObjectId>,
}

/// Persisted state of an instance. A spawn record exists exactly when the
/// instance is spawned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EncounterPhase {
    /// Zone assigned; waiting for the player to approach.
    Pending,
    /// Group created.
    Spawned(SpawnRecord),
}

impl EncounterPhase {
    /// State name used in views and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            EncounterPhase::Pending => "pending",
            EncounterPhase::Spawned(_) => "spawned",
        }
    }
}

/// The aggregate root for an encounter quest instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterInstance {
    /// Aggregate identifier.
    pub id: QuestId,
    /// The owning player.
    pub player_id: PlayerId,
    /// Contract table entry this instance was created from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    /// Rarity tier.
    pub tier: Tier,
    /// Units making up the group.
    pub composition: Composition,
    /// Counted units required to complete.
    pub total_unit_count: u32,
    /// Counted units defeated so far.
    pub progress: u32,
    /// Zone assigned at accept time.
    pub zone: Zone,
    /// Whether the zone is the tier's backup location.
    pub backup_location: bool,
    /// Dimension the zone lies in.
    pub dimension: DimensionId,
    /// Current state.
    pub phase: EncounterPhase,
    /// Number of events applied.
    pub version: i64,
    #[serde(skip)]
    uncommitted_events: Vec<EncounterEvent>,
}

impl EncounterInstance {
    /// Accepts a contract, producing an `Accepted` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the composition cannot be
    /// spawned.
    #[allow(clippy::too_many_arguments)]
    pub fn accept(
        id: QuestId,
        player_id: PlayerId,
        contract: Option<String>,
        tier: Tier,
        composition: Composition,
        zone: Zone,
        backup_location: bool,
        dimension: DimensionId,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        composition.validate()?;
        let total_unit_count = composition.counted_total();

        let mut instance = Self {
            id,
            player_id,
            contract,
            tier,
            composition,
            total_unit_count,
            progress: 0,
            zone,
            backup_location,
            dimension,
            phase: EncounterPhase::Pending,
            version: 0,
            uncommitted_events: Vec::new(),
        };
        let kind = EncounterEventKind::Accepted(EncounterAccepted {
            player_id,
            tier,
            zone_center: instance.zone.center,
            backup_location,
            total_unit_count,
        });
        instance.record(kind, correlation_id, clock);
        Ok(instance)
    }

    /// The spawn record, present only while spawned.
    #[must_use]
    pub fn spawn_record(&self) -> Option<&SpawnRecord> {
        match &self.phase {
            EncounterPhase::Pending => None,
            EncounterPhase::Spawned(record) => Some(record),
        }
    }

    /// Whether the instance is waiting for its trigger.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.phase, EncounterPhase::Pending)
    }

    /// Whether every counted unit is defeated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress >= self.total_unit_count
    }

    /// Counted units still to defeat.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.total_unit_count.saturating_sub(self.progress)
    }

    /// Where navigation points: the zone centre while pending, the group
    /// while spawned.
    #[must_use]
    pub fn navigation_target(&self) -> Position {
        match &self.phase {
            EncounterPhase::Pending => self.zone.center,
            EncounterPhase::Spawned(record) => record.location,
        }
    }

    fn invalid(&self, action: &'static str) -> DomainError {
        DomainError::InvalidTransition {
            quest_id: self.id,
            state: self.phase.name().to_owned(),
            action,
        }
    }

    /// Records that the trigger fired and the spawn is scheduled.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless pending.
    pub fn begin_spawn(
        &mut self,
        player_position: Position,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !self.is_pending() {
            return Err(self.invalid("trigger"));
        }
        self.record(
            EncounterEventKind::SpawnStarted(SpawnStarted { player_position }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Moves a pending instance to spawned.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless pending.
    pub fn record_spawn(
        &mut self,
        location: Position,
        object_ids: Vec<ObjectId>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !self.is_pending() {
            return Err(self.invalid("spawn"));
        }
        self.record(
            EncounterEventKind::Spawned(EncounterSpawned {
                location,
                object_ids,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Counts one defeated unit. Returns `true` when this kill completes the
    /// encounter. Kills past the total are not counted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless spawned.
    pub fn record_kill(
        &mut self,
        object_id: ObjectId,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        if self.spawn_record().is_none() {
            return Err(self.invalid("count a kill for"));
        }
        if self.is_complete() {
            return Ok(false);
        }
        let progress = self.progress + 1;
        self.record(
            EncounterEventKind::UnitDefeated(UnitDefeated {
                object_id,
                progress,
            }),
            correlation_id,
            clock,
        );
        if self.is_complete() {
            self.record(
                EncounterEventKind::Completed(EncounterCompleted { forced: false }),
                correlation_id,
                clock,
            );
            return Ok(true);
        }
        Ok(false)
    }

    /// Marks every unit defeated.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless spawned.
    pub fn force_complete(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.spawn_record().is_none() {
            return Err(self.invalid("complete"));
        }
        if !self.is_complete() {
            self.record(
                EncounterEventKind::Completed(EncounterCompleted { forced: true }),
                correlation_id,
                clock,
            );
        }
        Ok(())
    }

    /// Checks that the instance can be turned in.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless spawned and complete.
    pub fn ensure_turn_in_ready(&self) -> Result<(), DomainError> {
        if self.spawn_record().is_none() || !self.is_complete() {
            return Err(self.invalid("turn in"));
        }
        Ok(())
    }

    /// Records the turn-in. The caller removes the instance afterwards.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless spawned and complete.
    pub fn turn_in(
        &mut self,
        removed: usize,
        payout: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_turn_in_ready()?;
        self.record(
            EncounterEventKind::TurnedIn(EncounterTurnedIn { removed, payout }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Resets the instance for the available pool: pending, no spawn
    /// record, no progress.
    pub fn abandon(&mut self, removed: usize, correlation_id: Uuid, clock: &dyn Clock) {
        self.record(
            EncounterEventKind::Abandoned(EncounterAbandoned { removed }),
            correlation_id,
            clock,
        );
    }

    /// Forgets the live objects of a spawned group whose player left. The
    /// spawn location and progress are kept.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless spawned.
    pub fn suspend(
        &mut self,
        removed: usize,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.spawn_record().is_none() {
            return Err(self.invalid("suspend"));
        }
        self.record(
            EncounterEventKind::Suspended(EncounterSuspended { removed }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Records the objects recreated after a reconnect.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless spawned.
    pub fn restore(
        &mut self,
        object_ids: Vec<ObjectId>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.spawn_record().is_none() {
            return Err(self.invalid("restore"));
        }
        self.record(
            EncounterEventKind::Restored(EncounterRestored { object_ids }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Adds objects whose creation was deferred to the spawn record.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless spawned.
    pub fn attach_objects(
        &mut self,
        object_ids: Vec<ObjectId>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.spawn_record().is_none() {
            return Err(self.invalid("attach objects to"));
        }
        self.record(
            EncounterEventKind::ObjectsAttached(ObjectsAttached { object_ids }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Removes and returns the events produced since the last call.
    pub fn take_uncommitted_events(&mut self) -> Vec<EncounterEvent> {
        std::mem::take(&mut self.uncommitted_events)
    }

    fn record(&mut self, kind: EncounterEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = EncounterEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                quest_id: self.id,
                sequence_number: self.version + 1,
                correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        };
        self.apply(&event);
        self.uncommitted_events.push(event);
    }
}

impl AggregateRoot for EncounterInstance {
    type Event = EncounterEvent;

    fn aggregate_id(&self) -> QuestId {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            EncounterEventKind::Accepted(payload) => {
                self.player_id = payload.player_id;
                self.tier = payload.tier;
                self.total_unit_count = payload.total_unit_count;
                self.backup_location = payload.backup_location;
                self.progress = 0;
                self.phase = EncounterPhase::Pending;
            }
            EncounterEventKind::SpawnStarted(_) | EncounterEventKind::TurnedIn(_) => {}
            EncounterEventKind::Spawned(payload) => {
                self.phase = EncounterPhase::Spawned(SpawnRecord {
                    location: payload.location,
                    dimension: self.dimension.clone(),
                    region: payload.location.block().region(),
                    object_ids: payload.object_ids.clone(),
                });
            }
            EncounterEventKind::UnitDefeated(payload) => {
                self.progress = payload.progress.min(self.total_unit_count);
                if let EncounterPhase::Spawned(record) = &mut self.phase {
                    record.object_ids.retain(|id| *id != payload.object_id);
                }
            }
            EncounterEventKind::Completed(_) => {
                self.progress = self.total_unit_count;
            }
            EncounterEventKind::Abandoned(_) => {
                self.phase = EncounterPhase::Pending;
                self.progress = 0;
            }
            EncounterEventKind::Suspended(_) => {
                if let EncounterPhase::Spawned(record) = &mut self.phase {
                    record.object_ids.clear();
                }
            }
            EncounterEventKind::Restored(payload) => {
                if let EncounterPhase::Spawned(record) = &mut self.phase {
                    record.object_ids.clone_from(&payload.object_ids);
                }
            }
            EncounterEventKind::ObjectsAttached(payload) => {
                if let EncounterPhase::Spawned(record) = &mut self.phase {
                    record.object_ids.extend(payload.object_ids.iter().copied());
                }
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

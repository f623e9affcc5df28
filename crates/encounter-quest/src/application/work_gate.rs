//! Serialization of lifecycle work.
//!
//! Every operation that loads, mutates and saves a player's document runs
//! inside a [`PlayerWork`] guard, so two events for one player never
//! interleave across the store's awaits. Work for different players runs
//! concurrently. The orphan sweep takes the gate exclusively: it waits for
//! in-flight work to finish and holds new work back until it is done.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use encounter_core::error::DomainError;
use encounter_core::ids::PlayerId;
use tokio::sync::{
    Mutex as AsyncMutex, OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock,
};

use crate::application::context::lock;

/// Held for the duration of one unit of work on a player's document.
#[derive(Debug)]
pub struct PlayerWork {
    _player: OwnedMutexGuard<()>,
    _shared: OwnedRwLockReadGuard<()>,
}

/// Held for the duration of a sweep.
#[derive(Debug)]
pub struct ExclusiveWork {
    _gate: OwnedRwLockWriteGuard<()>,
}

/// Per-player locks plus the gate shared with the sweep.
#[derive(Debug, Default)]
pub struct WorkGate {
    shared: Arc<RwLock<()>>,
    players: Mutex<HashMap<PlayerId, Arc<AsyncMutex<()>>>>,
}

impl WorkGate {
    /// Creates an idle gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other work holds `player_id` and no sweep is running.
    ///
    /// Must not be called again for any player while the returned guard is
    /// held.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the lock table is poisoned.
    pub async fn enter(&self, player_id: PlayerId) -> Result<PlayerWork, DomainError> {
        let shared = Arc::clone(&self.shared).read_owned().await;
        let player_lock = {
            let mut players = lock(&self.players, "player lock table")?;
            // Entries nobody holds or waits on are dropped.
            players.retain(|_, entry| Arc::strong_count(entry) > 1);
            Arc::clone(players.entry(player_id).or_default())
        };
        let player = player_lock.lock_owned().await;
        Ok(PlayerWork {
            _player: player,
            _shared: shared,
        })
    }

    /// Waits for all in-flight work to finish and blocks new work until the
    /// returned guard is dropped.
    pub async fn exclusive(&self) -> ExclusiveWork {
        ExclusiveWork {
            _gate: Arc::clone(&self.shared).write_owned().await,
        }
    }

    /// Number of players with a lock entry.
    #[must_use]
    pub fn tracked_players(&self) -> usize {
        self.players.lock().map_or(0, |players| players.len())
    }
}

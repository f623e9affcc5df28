//! Route modules organized by surface.

pub mod admin;
pub mod encounters;
pub mod health;
pub mod players;
pub mod world;

use encounter_core::command::Command;
use tracing::info;

/// Logs a command as it enters its handler.
pub(crate) fn log_command(command: &impl Command) {
    match command.target_player() {
        Some(player_id) => info!(
            command_type = command.command_type(),
            correlation_id = %command.correlation_id(),
            %player_id,
            "handling command"
        ),
        None => info!(
            command_type = command.command_type(),
            correlation_id = %command.correlation_id(),
            "handling command"
        ),
    }
}

#[cfg(test)]
pub(crate) fn test_state() -> crate::state::AppState {
    use std::sync::{Arc, Mutex};

    use chrono::{TimeZone, Utc};
    use encounter_core::config::EncounterConfig;
    use encounter_core::rng::SeededRng;
    use encounter_quest::application::context::EncounterContext;
    use encounter_test_support::{
        FixedClock, FixedRewardService, MemoryQuestStore, RecordingNotifier,
    };
    use encounter_world::infrastructure::grid_world::GridWorld;

    let world = Arc::new(GridWorld::flat(63));
    let ctx = EncounterContext::new(
        EncounterConfig::default(),
        world.clone(),
        Arc::new(MemoryQuestStore::new()),
        Arc::new(FixedRewardService::new()),
        Arc::new(RecordingNotifier::new()),
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        )),
        Arc::new(Mutex::new(SeededRng::from_seed(11))),
    );
    crate::state::AppState::new(ctx, world)
}

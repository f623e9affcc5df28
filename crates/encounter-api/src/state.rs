//! Shared application state.

use std::sync::Arc;

use encounter_quest::application::context::EncounterContext;
use encounter_world::infrastructure::grid_world::GridWorld;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lifecycle collaborators and registries.
    pub ctx: EncounterContext,
    /// The standalone world the sidecar drives. `ctx.world` points at the
    /// same instance.
    pub world: Arc<GridWorld>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(ctx: EncounterContext, world: Arc<GridWorld>) -> Self {
        Self { ctx, world }
    }
}

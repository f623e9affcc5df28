//! Health check endpoint.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use encounter_world::domain::ownership::SYSTEM_TAG;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Players currently connected to the world.
    pub players_connected: usize,
    /// Live objects carrying the encounter marker.
    pub owned_objects: usize,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let world = state.ctx.world.as_ref();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        players_connected: world.connected_players().len(),
        owned_objects: world.objects_with_tag(SYSTEM_TAG).len(),
    })
}

/// Returns the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

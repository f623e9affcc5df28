//! Routes for world events: object deaths, damage checks and manual scans.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use encounter_core::error::DomainError;
use encounter_core::ids::ObjectId;
use encounter_core::world::DamageCause;
use encounter_quest::application::command_handlers::{self, DamageVerdict, KillAttribution};
use encounter_quest::application::proximity::{self, ScanReport};
use encounter_quest::domain::commands::RecordObjectDeath;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::log_command;
use crate::state::AppState;

/// Request body for POST /objects/{object_id}/damage.
#[derive(Debug, Deserialize)]
pub struct DamageRequest {
    /// What is dealing the damage.
    pub cause: DamageCause,
}

/// Response body for POST /objects/{object_id}/damage.
#[derive(Debug, Serialize)]
pub struct DamageResponse {
    /// Whether the damage proceeds.
    pub verdict: DamageVerdict,
}

/// POST /objects/{object_id}/death
#[instrument(skip(state))]
async fn object_death(
    State(state): State<AppState>,
    Path(object_id): Path<ObjectId>,
) -> Result<Json<KillAttribution>, ApiError> {
    let info = state
        .world
        .kill(object_id)
        .ok_or_else(|| DomainError::Validation(format!("unknown object {object_id}")))?;

    let command = RecordObjectDeath {
        correlation_id: Uuid::new_v4(),
        object_id,
        unit_type: info.unit_type,
        tags: info.tags,
    };

    log_command(&command);

    let attribution = command_handlers::handle_object_death(&command, &state.ctx).await?;
    Ok(Json(attribution))
}

/// POST /objects/{object_id}/damage
async fn object_damage(
    State(state): State<AppState>,
    Path(object_id): Path<ObjectId>,
    Json(request): Json<DamageRequest>,
) -> Result<Json<DamageResponse>, ApiError> {
    let verdict = command_handlers::guard_damage(&state.ctx, object_id, request.cause)?;
    Ok(Json(DamageResponse { verdict }))
}

/// POST /scan
async fn scan(State(state): State<AppState>) -> Result<Json<ScanReport>, ApiError> {
    let report = proximity::run_scan(&state.ctx).await?;
    Ok(Json(report))
}

/// Returns the router for world events.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/objects/{object_id}/death", post(object_death))
        .route("/objects/{object_id}/damage", post(object_damage))
        .route("/scan", post(scan))
}

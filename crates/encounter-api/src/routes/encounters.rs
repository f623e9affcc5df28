//! Routes for the encounter lifecycle: accept, abandon, turn in, inspect.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use encounter_core::ids::{PlayerId, QuestId};
use encounter_quest::application::query_handlers::{self, EncounterView, PlayerEncountersView};
use encounter_quest::application::command_handlers;
use encounter_quest::domain::commands::{
    AbandonEncounter, AcceptEncounter, EncounterOffer, TurnInEncounter,
};
use encounter_quest::domain::events::EncounterEvent;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::log_command;
use crate::state::AppState;

/// Request body for POST /accept.
#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    /// The accepting player.
    pub player_id: PlayerId,
    /// What is being accepted.
    pub offer: EncounterOffer,
}

/// Request body for commands addressed to a player's active encounter.
#[derive(Debug, Deserialize)]
pub struct PlayerRequest {
    /// The player.
    pub player_id: PlayerId,
}

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// IDs of the domain events produced.
    pub event_ids: Vec<Uuid>,
    /// Types of the domain events produced, in order.
    pub event_types: Vec<String>,
}

impl From<Vec<EncounterEvent>> for CommandResponse {
    fn from(events: Vec<EncounterEvent>) -> Self {
        Self {
            event_ids: events.iter().map(|e| e.metadata.event_id).collect(),
            event_types: events.into_iter().map(|e| e.metadata.event_type).collect(),
        }
    }
}

/// POST /accept
#[instrument(skip(state, request), fields(player_id = %request.player_id))]
async fn accept(
    State(state): State<AppState>,
    Json(request): Json<AcceptRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = AcceptEncounter {
        correlation_id: Uuid::new_v4(),
        player_id: request.player_id,
        offer: request.offer,
    };

    log_command(&command);

    let events = command_handlers::handle_accept(&command, &state.ctx).await?;
    Ok(Json(events.into()))
}

/// POST /abandon
#[instrument(skip(state, request), fields(player_id = %request.player_id))]
async fn abandon(
    State(state): State<AppState>,
    Json(request): Json<PlayerRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = AbandonEncounter {
        correlation_id: Uuid::new_v4(),
        player_id: request.player_id,
    };

    log_command(&command);

    let events = command_handlers::handle_abandon(&command, &state.ctx).await?;
    Ok(Json(events.into()))
}

/// POST /turn-in
#[instrument(skip(state, request), fields(player_id = %request.player_id))]
async fn turn_in(
    State(state): State<AppState>,
    Json(request): Json<PlayerRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = TurnInEncounter {
        correlation_id: Uuid::new_v4(),
        player_id: request.player_id,
    };

    log_command(&command);

    let events = command_handlers::handle_turn_in(&command, &state.ctx).await?;
    Ok(Json(events.into()))
}

/// GET /players/{player_id}
async fn player_encounters(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<PlayerEncountersView>, ApiError> {
    let view = query_handlers::get_player_encounters(&state.ctx, player_id).await?;
    Ok(Json(view))
}

/// GET /{quest_id}
async fn encounter_by_id(
    State(state): State<AppState>,
    Path(quest_id): Path<QuestId>,
) -> Result<Json<EncounterView>, ApiError> {
    let view = query_handlers::get_encounter_by_id(&state.ctx, quest_id).await?;
    Ok(Json(view))
}

/// Returns the router for the encounter lifecycle.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/accept", post(accept))
        .route("/abandon", post(abandon))
        .route("/turn-in", post(turn_in))
        .route("/players/{player_id}", get(player_encounters))
        .route("/{quest_id}", get(encounter_by_id))
}

//! Routes for player presence: connect, disconnect and movement.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use encounter_core::error::DomainError;
use encounter_core::geometry::Position;
use encounter_core::ids::{DimensionId, PlayerId};
use encounter_core::world::PlayerPose;
use encounter_quest::application::command_handlers;
use encounter_quest::domain::commands::{DisconnectPlayer, ReconnectPlayer};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::encounters::CommandResponse;
use crate::routes::log_command;
use crate::state::AppState;

/// Request body for POST /connect.
#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    /// The joining player.
    pub player_id: PlayerId,
    /// Dimension the player joins in; the configured default if omitted.
    #[serde(default)]
    pub dimension: Option<DimensionId>,
    /// Where the player appears.
    pub position: Position,
    /// Facing yaw in degrees.
    #[serde(default)]
    pub yaw: f64,
}

/// Request body for POST /disconnect.
#[derive(Debug, Deserialize)]
pub struct DisconnectRequest {
    /// The leaving player.
    pub player_id: PlayerId,
}

/// Request body for POST /move.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    /// The moving player.
    pub player_id: PlayerId,
    /// New position.
    pub position: Position,
    /// New facing yaw in degrees.
    #[serde(default)]
    pub yaw: f64,
}

/// POST /connect
#[instrument(skip(state, request), fields(player_id = %request.player_id))]
async fn connect(
    State(state): State<AppState>,
    Json(request): Json<ConnectRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let dimension = request
        .dimension
        .unwrap_or_else(|| state.ctx.config.default_dimension.clone());
    state.world.join(
        request.player_id,
        PlayerPose {
            dimension,
            position: request.position,
            yaw: request.yaw,
        },
    );

    let command = ReconnectPlayer {
        correlation_id: Uuid::new_v4(),
        player_id: request.player_id,
    };

    log_command(&command);

    let events = command_handlers::handle_reconnect(&command, &state.ctx).await?;
    Ok(Json(events.into()))
}

/// POST /disconnect
#[instrument(skip(state, request), fields(player_id = %request.player_id))]
async fn disconnect(
    State(state): State<AppState>,
    Json(request): Json<DisconnectRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    state.world.leave(request.player_id);

    let command = DisconnectPlayer {
        correlation_id: Uuid::new_v4(),
        player_id: request.player_id,
    };

    log_command(&command);

    let events = command_handlers::handle_disconnect(&command, &state.ctx).await?;
    Ok(Json(events.into()))
}

/// POST /move
async fn move_player(
    State(state): State<AppState>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<PlayerPose>, ApiError> {
    let moved = state
        .world
        .move_player(request.player_id, request.position, request.yaw);
    if !moved {
        return Err(not_connected(request.player_id).into());
    }
    let pose = state
        .ctx
        .world
        .player_pose(request.player_id)
        .ok_or_else(|| not_connected(request.player_id))?;
    Ok(Json(pose))
}

fn not_connected(player_id: PlayerId) -> DomainError {
    DomainError::Validation(format!("player {player_id} is not connected"))
}

/// Returns the router for player presence.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/connect", post(connect))
        .route("/disconnect", post(disconnect))
        .route("/move", post(move_player))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::routes::test_state;

    async fn post(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_connect_places_player_in_default_dimension() {
        // Arrange
        let state = test_state();
        let player_id = PlayerId::new();
        let body = json!({
            "player_id": player_id,
            "position": { "x": 10.5, "y": 64.0, "z": -3.5 }
        });

        // Act
        let (status, json) = post(router().with_state(state.clone()), "/connect", &body).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert!(json["event_ids"].as_array().unwrap().is_empty());
        let pose = state.ctx.world.player_pose(player_id).unwrap();
        assert_eq!(pose.dimension, DimensionId::new("overworld"));
    }

    #[tokio::test]
    async fn test_move_unknown_player_returns_400() {
        let app = router().with_state(test_state());
        let body = json!({
            "player_id": PlayerId::new(),
            "position": { "x": 0.0, "y": 64.0, "z": 0.0 },
            "yaw": 90.0
        });

        let (status, json) = post(app, "/move", &body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_disconnect_removes_player_from_world() {
        let state = test_state();
        let player_id = PlayerId::new();
        post(
            router().with_state(state.clone()),
            "/connect",
            &json!({ "player_id": player_id, "position": { "x": 0.0, "y": 64.0, "z": 0.0 } }),
        )
        .await;

        let (status, _) = post(
            router().with_state(state.clone()),
            "/disconnect",
            &json!({ "player_id": player_id }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(state.ctx.world.player_pose(player_id).is_none());
    }
}

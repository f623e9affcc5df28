//! Operator routes: inspect, force-complete, test groups, area clears,
//! live counts and on-demand sweeps.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use encounter_core::encounter::Composition;
use encounter_core::geometry::Position;
use encounter_core::ids::{DimensionId, PlayerId, QuestId};
use encounter_quest::application::admin::{self, TestGroup};
use encounter_quest::application::query_handlers::{self, EncounterView};
use encounter_quest::application::reaper::{self, SweepReport};
use encounter_quest::domain::commands::ForceComplete;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::encounters::CommandResponse;
use crate::routes::log_command;
use crate::state::AppState;

/// Request body for POST /force-complete.
#[derive(Debug, Deserialize)]
pub struct ForceCompleteRequest {
    /// The player whose encounter is completed.
    pub player_id: PlayerId,
}

/// Request body for POST /force-spawn.
#[derive(Debug, Deserialize)]
pub struct ForceSpawnRequest {
    /// The player to summon the group next to.
    pub player_id: PlayerId,
    /// The group.
    pub composition: Composition,
}

/// Request body for POST /force-despawn.
#[derive(Debug, Deserialize)]
pub struct ForceDespawnRequest {
    /// Dimension to clear; the configured default if omitted.
    #[serde(default)]
    pub dimension: Option<DimensionId>,
    /// Centre of the cleared area.
    pub center: Position,
    /// Horizontal radius of the cleared area.
    pub radius: f64,
}

/// Response body for POST /force-despawn.
#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    /// Objects removed.
    pub removed: usize,
}

/// Response body for GET /live-count/{quest_id}.
#[derive(Debug, Serialize)]
pub struct LiveCountResponse {
    /// The instance.
    pub quest_id: QuestId,
    /// Live objects it owns.
    pub live: usize,
}

/// GET /players/{player_id}/active
async fn inspect(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<EncounterView>, ApiError> {
    let view = query_handlers::get_active_encounter(&state.ctx, player_id).await?;
    Ok(Json(view))
}

/// POST /force-complete
#[instrument(skip(state, request), fields(player_id = %request.player_id))]
async fn force_complete(
    State(state): State<AppState>,
    Json(request): Json<ForceCompleteRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = ForceComplete {
        correlation_id: Uuid::new_v4(),
        player_id: request.player_id,
    };

    log_command(&command);

    let events = admin::force_complete(&command, &state.ctx).await?;
    Ok(Json(events.into()))
}

/// POST /force-spawn
async fn force_spawn(
    State(state): State<AppState>,
    Json(request): Json<ForceSpawnRequest>,
) -> Result<Json<TestGroup>, ApiError> {
    let group = admin::force_spawn_test_group(&state.ctx, request.player_id, &request.composition)?;
    Ok(Json(group))
}

/// POST /force-despawn
async fn force_despawn(
    State(state): State<AppState>,
    Json(request): Json<ForceDespawnRequest>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let dimension = request
        .dimension
        .unwrap_or_else(|| state.ctx.config.default_dimension.clone());
    let removed =
        admin::force_despawn_radius(&state.ctx, &dimension, request.center, request.radius)?;
    Ok(Json(RemovedResponse { removed }))
}

/// GET /live-count/{quest_id}
async fn live_count(
    State(state): State<AppState>,
    Path(quest_id): Path<QuestId>,
) -> Result<Json<LiveCountResponse>, ApiError> {
    let live = admin::count_live(&state.ctx, quest_id)?;
    Ok(Json(LiveCountResponse { quest_id, live }))
}

/// POST /sweep
async fn sweep(State(state): State<AppState>) -> Result<Json<SweepReport>, ApiError> {
    let report = reaper::sweep(&state.ctx).await?;
    Ok(Json(report))
}

/// Returns the router for operator commands.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/players/{player_id}/active", get(inspect))
        .route("/force-complete", post(force_complete))
        .route("/force-spawn", post(force_spawn))
        .route("/force-despawn", post(force_despawn))
        .route("/live-count/{quest_id}", get(live_count))
        .route("/sweep", post(sweep))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use encounter_core::encounter::UnitGroup;
    use encounter_core::world::PlayerPose;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::routes::test_state;

    async fn send(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<&Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn join(state: &AppState, player_id: PlayerId) {
        state.world.join(
            player_id,
            PlayerPose {
                dimension: DimensionId::new("overworld"),
                position: Position::new(0.5, 64.0, 0.5),
                yaw: 0.0,
            },
        );
    }

    #[tokio::test]
    async fn test_force_spawn_then_despawn_area() {
        // Arrange
        let state = test_state();
        let player_id = PlayerId::new();
        join(&state, player_id);

        // Act
        let (spawn_status, group) = send(
            router().with_state(state.clone()),
            "POST",
            "/force-spawn",
            Some(&json!({
                "player_id": player_id,
                "composition": [{ "unit_type": "zombie", "count": 4 }]
            })),
        )
        .await;
        let quest_id = group["quest_id"].as_str().unwrap().to_owned();
        let (_, live) = send(
            router().with_state(state.clone()),
            "GET",
            &format!("/live-count/{quest_id}"),
            None,
        )
        .await;
        let body = json!({ "center": { "x": 0.5, "y": 64.0, "z": 0.5 }, "radius": 64.0 });
        let (despawn_status, removed) = send(
            router().with_state(state.clone()),
            "POST",
            "/force-despawn",
            Some(&body),
        )
        .await;

        // Assert
        assert_eq!(spawn_status, StatusCode::OK);
        assert_eq!(group["object_ids"].as_array().unwrap().len(), 4);
        assert_eq!(live["live"], 4);
        assert_eq!(despawn_status, StatusCode::OK);
        assert_eq!(removed["removed"], 4);
        assert_eq!(state.world.object_count(), 0);
    }

    #[tokio::test]
    async fn test_force_despawn_with_zero_radius_returns_400() {
        let app = router().with_state(test_state());
        let body = json!({ "center": { "x": 0.0, "y": 64.0, "z": 0.0 }, "radius": 0.0 });

        let (status, json) = send(app, "POST", "/force-despawn", Some(&body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_sweep_removes_test_groups() {
        let state = test_state();
        let player_id = PlayerId::new();
        join(&state, player_id);
        let skeletons = Composition(vec![UnitGroup::new("skeleton", 2)]);
        admin::force_spawn_test_group(&state.ctx, player_id, &skeletons).unwrap();

        let app = router().with_state(state.clone());

        let (status, report) = send(app, "POST", "/sweep", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["removed"], 2);
        assert_eq!(state.world.object_count(), 0);
    }

    #[tokio::test]
    async fn test_inspect_without_encounter_returns_404() {
        let app = router().with_state(test_state());

        let (status, json) = send(
            app,
            "GET",
            &format!("/players/{}/active", PlayerId::new()),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "no_active_encounter");
    }
}

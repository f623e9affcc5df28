//! Encounter runtime HTTP sidecar.
//!
//! Exposes host event ingestion and the operator surface over HTTP and runs
//! the periodic proximity scan and the startup orphan sweep.

pub mod error;
pub mod rewards;
pub mod routes;
pub mod scheduler;
pub mod state;

use axum::Router;

/// Builds the full router. Used by `main.rs` and the route tests.
pub fn app(state: state::AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/encounters", routes::encounters::router())
        .nest("/api/v1/players", routes::players::router())
        .nest("/api/v1/world", routes::world::router())
        .nest("/api/v1/admin", routes::admin::router())
        .with_state(state)
}

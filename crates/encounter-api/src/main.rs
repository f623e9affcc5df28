//! Encounter runtime sidecar entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use encounter_api::error::AppError;
use encounter_api::rewards::LoggedRewardService;
use encounter_api::scheduler::spawn_background;
use encounter_api::state::AppState;
use encounter_core::clock::SystemClock;
use encounter_core::config::EncounterConfig;
use encounter_core::notify::TracingNotifier;
use encounter_core::rng::SeededRng;
use encounter_quest::application::context::EncounterContext;
use encounter_store::file_quest_store::FileQuestStore;
use encounter_world::infrastructure::grid_world::GridWorld;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Ground height of the standalone world.
const GROUND_Y: i32 = 63;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting encounter sidecar");

    // Read configuration from file and environment.
    let config_path = std::env::var_os("ENCOUNTER_CONFIG").map(PathBuf::from);
    let mut config = EncounterConfig::load(config_path.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok())?;
    let data_dir =
        std::env::var("ENCOUNTER_DATA_DIR").unwrap_or_else(|_| "data/quests".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;

    // Build collaborators.
    let store = FileQuestStore::open(&data_dir).await?;
    tracing::info!(data_dir = %store.root().display(), "quest store ready");
    let world = Arc::new(GridWorld::flat(GROUND_Y));
    let ctx = EncounterContext::new(
        config,
        world.clone(),
        Arc::new(store),
        Arc::new(LoggedRewardService),
        Arc::new(TracingNotifier),
        Arc::new(SystemClock),
        Arc::new(Mutex::new(SeededRng::from_entropy())),
    );

    let background = spawn_background(&ctx);

    // Build router.
    let app = encounter_api::app(AppState::new(ctx, world))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    background.scan.abort();
    background.sweep.abort();
    Ok(())
}

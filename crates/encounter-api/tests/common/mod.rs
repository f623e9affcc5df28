//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeDelta, TimeZone, Utc};
use encounter_api::state::AppState;
use encounter_core::config::EncounterConfig;
use encounter_core::rng::SeededRng;
use encounter_quest::application::context::EncounterContext;
use encounter_test_support::{FixedRewardService, ManualClock, MemoryQuestStore, RecordingNotifier};
use encounter_world::infrastructure::grid_world::GridWorld;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// A wired sidecar over an in-memory store and a manual clock.
pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub store: Arc<MemoryQuestStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let world = Arc::new(GridWorld::flat(63));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        ));
        let notifier = Arc::new(RecordingNotifier::new());
        let store = Arc::new(MemoryQuestStore::new());
        let ctx = EncounterContext::new(
            EncounterConfig::default(),
            world.clone(),
            store.clone(),
            Arc::new(FixedRewardService::new()),
            notifier.clone(),
            clock.clone(),
            Arc::new(Mutex::new(SeededRng::from_seed(3))),
        );
        Self {
            state: AppState::new(ctx, world),
            clock,
            notifier,
            store,
        }
    }

    /// The full router, with the same route structure as `main.rs`.
    pub fn router(&self) -> Router {
        encounter_api::app(self.state.clone())
    }

    pub fn advance(&self, millis: i64) {
        self.clock.advance(TimeDelta::milliseconds(millis));
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: &serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        post_json(self.router(), uri, body).await
    }

    pub async fn post_empty(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        send(self.router(), request).await
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        get_json(self.router(), uri).await
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

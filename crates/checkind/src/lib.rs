//! checkind: Backend test double for the face check-in client.
//!
//! Serves the admin event API plus `/register` and `/identify` over HTTP,
//! keeping everything in memory and delegating image encoding to a
//! [`FaceEncoder`](checkin_core::FaceEncoder) on a dedicated thread.

pub mod admin;
pub mod checkin;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod store;

use axum::extract::DefaultBodyLimit;
use axum::{routing::get, Json, Router};
use checkin_core::api::Health;
use engine::EngineHandle;
use std::sync::Arc;
use store::Store;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// State shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub engine: EngineHandle,
    pub similarity_threshold: f32,
}

impl AppState {
    pub fn new(engine: EngineHandle, similarity_threshold: f32) -> Self {
        Self {
            store: Arc::new(Store::new()),
            engine,
            similarity_threshold,
        }
    }
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Build the full application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(admin::routes())
        .merge(checkin::routes())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

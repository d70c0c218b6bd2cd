//! WebAPI - HTTP and WebSocket endpoints
//!
//! ## Responsibilities
//!
//! - HTTP API routes (single-shot detection, health, admin)
//! - WebSocket upgrade and socket <-> SessionHub bridging
//! - Response formatting

mod routes;
mod stream_routes;

pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::models::{HealthResponse, RootStatus};
use crate::state::AppState;

/// Full application: API router, optional static client, CORS and request tracing
pub fn build_app(state: AppState) -> Router {
    let mut app = create_router(state.clone());

    // Optional test client page
    if let Some(static_dir) = &state.config.static_dir {
        app = app.fallback_service(ServeDir::new(static_dir));
        tracing::info!(static_dir = %static_dir.display(), "Static file serving enabled");
    }

    app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

/// Root liveness endpoint
pub async fn root() -> impl IntoResponse {
    Json(RootStatus::default())
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let classifier = state.pipeline.classifier();
    let detector_ok = classifier.detector_healthy().await;

    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_sec: state.uptime_sec(),
        detector: classifier.detector_name().to_string(),
        detector_connected: detector_ok,
        active_sessions: state.sessions.session_count(),
    };

    Json(response)
}

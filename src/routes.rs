use axum::{
    http::Method,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::meeting::{get_meeting, schedule_meeting};
use crate::shared::AppState;
use crate::signaling::signaling_handler;

/// Builds the HTTP surface: signaling upgrade, booking API and health probe
pub fn app(app_state: AppState) -> Router {
    // Credentials are never allowed alongside a wildcard origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/ws/signaling", get(signaling_handler))
        .route("/api/schedule", post(schedule_meeting))
        .route("/api/meeting/:id", get(get_meeting))
        .route("/api/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

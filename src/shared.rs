use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::meeting::{repository::MeetingRepository, Clock};
use crate::signaling::SignalingRouter;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub signaling: Arc<SignalingRouter>,
    pub meeting_repository: Arc<dyn MeetingRepository + Send + Sync>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        signaling: Arc<SignalingRouter>,
        meeting_repository: Arc<dyn MeetingRepository + Send + Sync>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            signaling,
            meeting_repository,
            clock,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

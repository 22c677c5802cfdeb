use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::MeetingModel,
    service::MeetingService,
    types::{ScheduleMeetingRequest, ScheduleMeetingResponse},
};
use crate::shared::{AppError, AppState};

/// HTTP handler for booking a meeting
///
/// POST /api/schedule
/// Returns the id of the stored meeting
#[instrument(name = "schedule_meeting", skip(state, payload))]
pub async fn schedule_meeting(
    State(state): State<AppState>,
    payload: Result<Json<ScheduleMeetingRequest>, JsonRejection>,
) -> Result<Json<ScheduleMeetingResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Rejecting unreadable booking request");
        AppError::BadRequest("Invalid request".to_string())
    })?;

    let service = MeetingService::new(
        Arc::clone(&state.meeting_repository),
        Arc::clone(&state.clock),
    );
    let response = service.schedule_meeting(request).await?;

    Ok(Json(response))
}

/// HTTP handler for fetching a meeting
///
/// GET /api/meeting/:id
#[instrument(name = "get_meeting", skip(state))]
pub async fn get_meeting(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
) -> Result<Json<MeetingModel>, AppError> {
    let service = MeetingService::new(
        Arc::clone(&state.meeting_repository),
        Arc::clone(&state.clock),
    );
    let meeting = service.get_meeting(&meeting_id).await?;

    info!(meeting_id = %meeting.id, "Meeting fetched");
    Ok(Json(meeting))
}

use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    clock::Clock,
    models::MeetingModel,
    repository::MeetingRepository,
    types::{ScheduleMeetingRequest, ScheduleMeetingResponse},
};
use crate::shared::AppError;

/// Date and time as submitted by the booking form, read as UTC
const MEETING_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Service for handling meeting booking logic
pub struct MeetingService {
    repository: Arc<dyn MeetingRepository + Send + Sync>,
    clock: Arc<dyn Clock>,
}

impl MeetingService {
    pub fn new(repository: Arc<dyn MeetingRepository + Send + Sync>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Validates and stores a booking
    #[instrument(skip(self, request))]
    pub async fn schedule_meeting(
        &self,
        request: ScheduleMeetingRequest,
    ) -> Result<ScheduleMeetingResponse, AppError> {
        validate_fields(&request)?;

        let starts_at = parse_meeting_time(&request.date, &request.time)?;
        let now = self.clock.now();
        if starts_at <= now {
            warn!(starts_at = %starts_at, "Rejecting meeting that is not in the future");
            return Err(AppError::BadRequest(
                "Meeting date and time must be in the future".to_string(),
            ));
        }

        let meeting = MeetingModel::new(request, now);
        self.repository.create_meeting(&meeting).await?;

        info!(meeting_id = %meeting.id, starts_at = %starts_at, "Meeting scheduled");
        Ok(ScheduleMeetingResponse { id: meeting.id })
    }

    #[instrument(skip(self))]
    pub async fn get_meeting(&self, meeting_id: &str) -> Result<MeetingModel, AppError> {
        self.repository
            .get_meeting(meeting_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Meeting not found".to_string()))
    }
}

fn validate_fields(request: &ScheduleMeetingRequest) -> Result<(), AppError> {
    let fields = [
        ("name", &request.name),
        ("email", &request.email),
        ("purpose", &request.purpose),
        ("date", &request.date),
        ("time", &request.time),
        ("timezone", &request.timezone),
    ];

    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| *field)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Missing fields: {}",
            missing.join(", ")
        )))
    }
}

/// Parses a `YYYY-MM-DD` date and `HH:MM` time into a UTC instant
pub fn parse_meeting_time(date: &str, time: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = format!("{}T{}", date.trim(), time.trim());
    NaiveDateTime::parse_from_str(&raw, MEETING_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| AppError::BadRequest("Invalid date or time format".to_string()))
}

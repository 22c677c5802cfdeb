use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::types::ScheduleMeetingRequest;

/// Database model for meetings table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct MeetingModel {
    pub id: String, // UUID v7, so ids sort by creation time
    pub name: String,
    pub email: String,
    pub purpose: String,
    pub date: String, // YYYY-MM-DD
    pub time: String, // HH:MM
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

impl MeetingModel {
    /// Creates a meeting record with a generated ID
    pub fn new(request: ScheduleMeetingRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            name: request.name,
            email: request.email,
            purpose: request.purpose,
            date: request.date,
            time: request.time,
            timezone: request.timezone,
            created_at,
        }
    }
}

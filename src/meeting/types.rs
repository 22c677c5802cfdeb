use serde::{Deserialize, Serialize};

/// Request payload for booking a meeting. Absent fields decode as blank and
/// are rejected by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleMeetingRequest {
    pub name: String,
    pub email: String,
    pub purpose: String,
    pub date: String,
    pub time: String,
    pub timezone: String,
}

/// Response for a booked meeting
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleMeetingResponse {
    pub id: String,
}

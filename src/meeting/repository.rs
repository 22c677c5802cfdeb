use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

use super::models::MeetingModel;
use crate::shared::AppError;

/// Trait for meeting repository operations
#[async_trait]
pub trait MeetingRepository {
    /// Stores a new meeting; an existing id is an error
    async fn create_meeting(&self, meeting: &MeetingModel) -> Result<(), AppError>;
    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<MeetingModel>, AppError>;
}

/// In-memory implementation of MeetingRepository for development and testing
///
/// Data is lost when the application restarts.
pub struct InMemoryMeetingRepository {
    meetings: Mutex<HashMap<String, MeetingModel>>,
}

impl Default for InMemoryMeetingRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMeetingRepository {
    pub fn new() -> Self {
        Self {
            meetings: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MeetingModel>> {
        self.meetings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the current number of stored meetings
    pub fn meeting_count(&self) -> usize {
        self.lock().len()
    }
}

#[async_trait]
impl MeetingRepository for InMemoryMeetingRepository {
    #[instrument(skip(self, meeting))]
    async fn create_meeting(&self, meeting: &MeetingModel) -> Result<(), AppError> {
        debug!(meeting_id = %meeting.id, "Creating meeting in memory");

        let mut meetings = self.lock();
        if meetings.contains_key(&meeting.id) {
            warn!(meeting_id = %meeting.id, "Meeting already exists in memory");
            return Err(AppError::DatabaseError(
                "Meeting already exists".to_string(),
            ));
        }
        meetings.insert(meeting.id.clone(), meeting.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<MeetingModel>, AppError> {
        let meeting = self.lock().get(meeting_id).cloned();
        if meeting.is_none() {
            debug!(meeting_id = %meeting_id, "Meeting not found in memory");
        }
        Ok(meeting)
    }
}

/// PostgreSQL implementation of meeting repository
pub struct PostgresMeetingRepository {
    pool: PgPool,
}

impl PostgresMeetingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the meetings table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS meetings (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                purpose TEXT NOT NULL,
                date TEXT NOT NULL,
                time TEXT NOT NULL,
                timezone TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create meetings table");
            AppError::DatabaseError(e.to_string())
        })?;

        info!("Meetings table ready");
        Ok(())
    }
}

#[async_trait]
impl MeetingRepository for PostgresMeetingRepository {
    #[instrument(skip(self, meeting))]
    async fn create_meeting(&self, meeting: &MeetingModel) -> Result<(), AppError> {
        debug!(meeting_id = %meeting.id, "Creating meeting in database");

        sqlx::query(
            "INSERT INTO meetings (id, name, email, purpose, date, time, timezone, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        )
        .bind(&meeting.id)
        .bind(&meeting.name)
        .bind(&meeting.email)
        .bind(&meeting.purpose)
        .bind(&meeting.date)
        .bind(&meeting.time)
        .bind(&meeting.timezone)
        .bind(meeting.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, meeting_id = %meeting.id, "Failed to create meeting in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<MeetingModel>, AppError> {
        sqlx::query_as::<_, MeetingModel>(
            "SELECT id, name, email, purpose, date, time, timezone, created_at FROM meetings WHERE id = $1",
        )
        .bind(meeting_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, meeting_id = %meeting_id, "Failed to fetch meeting from database");
            AppError::DatabaseError(e.to_string())
        })
    }
}

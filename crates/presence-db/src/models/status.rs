//! Status database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the users_status table
#[derive(Debug, Clone, FromRow)]
pub struct StatusModel {
    pub id: Uuid,
    pub subject_id: String,
    pub online: bool,
    pub last_activity_at: Option<DateTime<Utc>>,
}

//! Status record entity - one persisted presence row per subject

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::SubjectId;

/// Persisted presence state of a single subject.
///
/// Created lazily on the subject's first write and never deleted by the
/// presence core. The stored `online` flag is only advisory: see
/// [`crate::evaluator`] for how staleness overrides it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: Uuid,
    pub subject_id: SubjectId,
    pub online: bool,
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl StatusRecord {
    /// Create a new record with a fresh ID
    pub fn new(subject_id: SubjectId, fields: StatusFields) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject_id,
            online: fields.online,
            last_activity_at: fields.last_activity_at,
        }
    }

    /// Overwrite the mutable fields
    pub fn apply(&mut self, fields: StatusFields) {
        self.online = fields.online;
        self.last_activity_at = fields.last_activity_at;
    }

    /// Current mutable fields
    #[must_use]
    pub fn fields(&self) -> StatusFields {
        StatusFields {
            online: self.online,
            last_activity_at: self.last_activity_at,
        }
    }

    /// Time elapsed since the last recorded activity, if any
    pub fn activity_age(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.last_activity_at.map(|at| now - at)
    }
}

/// The mutable field set written by create and update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFields {
    pub online: bool,
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl StatusFields {
    /// Fields for a write stamped at `now`
    #[must_use]
    pub fn new(online: bool, now: DateTime<Utc>) -> Self {
        Self {
            online,
            last_activity_at: Some(now),
        }
    }
}

//! Change events - create/update/delete notifications for status records

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::StatusRecord;

/// Kind of record change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl ChangeKind {
    /// Whether a subscriber should re-evaluate presence on this kind.
    ///
    /// Deletes are ignored: staleness alone governs offline transitions.
    #[must_use]
    pub fn triggers_evaluation(self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A change notification: `{ "event": "create"|"update"|"delete", "payload": {...} }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub event: ChangeKind,
    pub payload: StatusRecord,
}

impl ChangeEvent {
    #[must_use]
    pub fn created(record: StatusRecord) -> Self {
        Self {
            event: ChangeKind::Create,
            payload: record,
        }
    }

    #[must_use]
    pub fn updated(record: StatusRecord) -> Self {
        Self {
            event: ChangeKind::Update,
            payload: record,
        }
    }

    #[must_use]
    pub fn deleted(record: StatusRecord) -> Self {
        Self {
            event: ChangeKind::Delete,
            payload: record,
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

//! Record filters and queries understood by every record store

use crate::entities::StatusRecord;
use crate::value_objects::SubjectId;

/// Filter selecting status records
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordFilter {
    /// Records owned by one subject
    Subject(SubjectId),
}

impl RecordFilter {
    #[must_use]
    pub fn subject(subject_id: SubjectId) -> Self {
        Self::Subject(subject_id)
    }

    /// The subject this filter is scoped to
    pub fn subject_id(&self) -> &SubjectId {
        match self {
            Self::Subject(id) => id,
        }
    }

    /// Check whether a record passes the filter
    pub fn matches(&self, record: &StatusRecord) -> bool {
        match self {
            Self::Subject(id) => &record.subject_id == id,
        }
    }
}

/// Filter plus result limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub filter: RecordFilter,
    pub limit: usize,
}

impl RecordQuery {
    /// Query with the default limit of one record
    #[must_use]
    pub fn new(filter: RecordFilter) -> Self {
        Self { filter, limit: 1 }
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

//! Pub/Sub channel definitions.
//!
//! Each record gets one channel named `{collection}:{subject_id}`.

use presence_core::{RecordFilter, StatusRecord, SubjectId};

/// Separator between collection and subject in a channel name
pub const CHANNEL_SEPARATOR: char = ':';

/// Redis channel carrying changes for one subject's record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeChannel {
    pub collection: String,
    pub subject_id: SubjectId,
}

impl ChangeChannel {
    #[must_use]
    pub fn new(collection: impl Into<String>, subject_id: SubjectId) -> Self {
        Self {
            collection: collection.into(),
            subject_id,
        }
    }

    /// Channel a filtered subscription listens on
    #[must_use]
    pub fn for_filter(collection: &str, filter: &RecordFilter) -> Self {
        Self::new(collection, filter.subject_id().clone())
    }

    /// Channel a record's changes are published to
    #[must_use]
    pub fn for_record(collection: &str, record: &StatusRecord) -> Self {
        Self::new(collection, record.subject_id.clone())
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}{CHANNEL_SEPARATOR}{}", self.collection, self.subject_id)
    }

    /// Parse a channel name back to a `ChangeChannel`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let (collection, subject) = name.split_once(CHANNEL_SEPARATOR)?;
        if collection.is_empty() {
            return None;
        }
        let subject_id = SubjectId::new(subject).ok()?;
        Some(Self::new(collection, subject_id))
    }
}

impl std::fmt::Display for ChangeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

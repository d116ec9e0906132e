//! Last evaluated online flag per subject.
//!
//! Written by status checks and by subscription evaluations; read by callers
//! that want the most recent answer without hitting the record store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use presence_core::SubjectId;

/// Shared map of `SubjectId -> online`
#[derive(Debug, Default)]
pub struct PresenceCache {
    statuses: DashMap<SubjectId, bool>,
    writes: AtomicU64,
}

impl PresenceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached flag for a subject; `None` if never evaluated
    pub fn get(&self, subject_id: &SubjectId) -> Option<bool> {
        self.statuses.get(subject_id).map(|entry| *entry)
    }

    /// Record an evaluation result (last write wins)
    pub fn set(&self, subject_id: SubjectId, online: bool) {
        self.statuses.insert(subject_id, online);
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn remove(&self, subject_id: &SubjectId) -> Option<bool> {
        self.statuses.remove(subject_id).map(|(_, online)| online)
    }

    /// Copy of the whole map
    pub fn snapshot(&self) -> HashMap<SubjectId, bool> {
        self.statuses
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn clear(&self) {
        self.statuses.clear();
    }

    /// Total number of `set` calls since creation
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

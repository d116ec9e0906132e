//! Status evaluator - derives online/offline from a status record
//!
//! A subject is online only when its record says so *and* its last activity
//! is no older than the staleness threshold. Staleness dominates the stored
//! flag, and a missing record or timestamp always means offline.

use chrono::{DateTime, TimeDelta, Utc};

use crate::entities::StatusRecord;

/// Offline threshold used when none is configured (minutes)
pub const DEFAULT_OFFLINE_THRESHOLD_MINUTES: u32 = 7;

/// Evaluate presence for `record` at `now` with a threshold in minutes.
///
/// Pure: no I/O, never mutates the record. Timestamps in the future (clock
/// skew between writers) count as fresh.
pub fn evaluate(record: Option<&StatusRecord>, now: DateTime<Utc>, threshold_minutes: u32) -> bool {
    StatusEvaluator::new(threshold_minutes).evaluate(record, now)
}

/// Evaluator bound to a fixed staleness threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEvaluator {
    threshold: TimeDelta,
}

impl StatusEvaluator {
    #[must_use]
    pub fn new(threshold_minutes: u32) -> Self {
        Self {
            threshold: TimeDelta::minutes(i64::from(threshold_minutes)),
        }
    }

    /// Staleness threshold
    pub fn threshold(&self) -> TimeDelta {
        self.threshold
    }

    pub fn evaluate(&self, record: Option<&StatusRecord>, now: DateTime<Utc>) -> bool {
        let Some(record) = record else {
            return false;
        };
        match record.activity_age(now) {
            Some(age) => record.online && age <= self.threshold,
            None => false,
        }
    }
}

impl Default for StatusEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_OFFLINE_THRESHOLD_MINUTES)
    }
}

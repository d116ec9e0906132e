//! Test fixtures and data generators
//!
//! Provides reusable test data for integration tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use presence_common::PresenceSettings;
use presence_core::{StatusFields, StatusRecord, SubjectId};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Debounce window used by [`test_settings`]
pub const WINDOW: Duration = Duration::from_millis(1000);

/// Poll interval used by [`test_settings`]
pub const POLL: Duration = Duration::from_secs(5);

/// Fixed start time for the manual clock
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn subject(id: &str) -> SubjectId {
    SubjectId::new(id).unwrap()
}

/// Subject id that no other test uses
pub fn unique_subject() -> SubjectId {
    subject(&format!("user-{}", unique_suffix()))
}

/// Record as if `subject` was last active at `at`
pub fn status_record(subject_id: &SubjectId, online: bool, at: DateTime<Utc>) -> StatusRecord {
    StatusRecord::new(subject_id.clone(), StatusFields::new(online, at))
}

/// Settings with the default threshold and short, round timings
pub fn test_settings() -> PresenceSettings {
    PresenceSettings {
        activity_debounce_ms: WINDOW.as_millis() as u64,
        status_check_interval_ms: POLL.as_millis() as u64,
        change_buffer: 16,
        ..PresenceSettings::default()
    }
}

/// [`test_settings`] with a poll interval long enough to never fire in a test
pub fn stream_only_settings() -> PresenceSettings {
    PresenceSettings {
        status_check_interval_ms: 3_600_000,
        ..test_settings()
    }
}

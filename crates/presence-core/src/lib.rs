//! # presence-core
//!
//! Domain layer for presence tracking: subject identifiers, status records,
//! change events, the staleness evaluator, and the ports (traits) that the
//! storage and change-bus adapters implement.
//! This crate has zero dependencies on infrastructure (database, Redis, etc.).

pub mod clock;
pub mod entities;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use clock::{Clock, ManualClock, SystemClock};
pub use entities::{StatusFields, StatusRecord};
pub use error::DomainError;
pub use evaluator::{evaluate, StatusEvaluator, DEFAULT_OFFLINE_THRESHOLD_MINUTES};
pub use events::{ChangeEvent, ChangeKind};
pub use traits::{
    ChangeBus, ChangeFeed, ChangePublisher, ChangeSubscription, RecordFilter, RecordQuery,
    RecordStore, StoreResult, USERS_STATUS_COLLECTION,
};
pub use value_objects::SubjectId;

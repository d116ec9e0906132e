//! # presence-service
//!
//! Application layer: turns local activity into status writes and keeps the
//! presence cache in sync with the record store through polling and change
//! streams.

pub mod services;

pub use services::{
    ActivityDebouncer, CancelToken, NotifyingStore, PresenceService, PresenceWriter,
    ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult, StatusProbe,
    SubscriptionHandle, SubscriptionRegistry, SubscriptionState, WriteOutcome,
};

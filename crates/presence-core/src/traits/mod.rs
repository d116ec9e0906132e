//! Ports implemented by the storage and change-bus adapters

mod ports;
mod query;

pub use ports::{
    ChangeBus, ChangeFeed, ChangePublisher, ChangeSubscription, RecordStore, StoreResult,
    USERS_STATUS_COLLECTION,
};
pub use query::{RecordFilter, RecordQuery};

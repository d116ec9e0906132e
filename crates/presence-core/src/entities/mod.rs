//! Domain entities

mod status_record;

pub use status_record::{StatusFields, StatusRecord};

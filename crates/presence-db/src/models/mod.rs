//! Database models (SQLx `FromRow`)

mod status;

pub use status::StatusModel;

//! Record store implementations backed by PostgreSQL

mod error;
mod status;

pub use error::{check_collection, map_db_error};
pub use status::PgStatusStore;

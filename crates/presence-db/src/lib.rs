//! # presence-db
//!
//! Record store layer implementing [`presence_core::RecordStore`].
//!
//! ## Overview
//!
//! - Connection pool management
//! - Database models with SQLx `FromRow` derives
//! - Model → entity mappers
//! - The PostgreSQL `users_status` store and an in-process store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use presence_db::pool::{create_pool, DatabaseConfig};
//! use presence_db::PgStatusStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::from_env()).await?;
//!     let store = PgStatusStore::new(pool);
//!     store.ensure_schema().await?;
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::MemoryStatusStore;
pub use pool::{create_pool, create_pool_from_env, DatabaseConfig, PgPool};
pub use repositories::PgStatusStore;

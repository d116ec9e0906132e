//! # presence-cache
//!
//! Local presence cache plus the change-bus adapters that feed it.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Presence Cache**: Last evaluated online flag per subject
//! - **Pub/Sub**: Record change notifications over Redis channels
//! - **Local Bus**: In-process change bus for single-node runs and tests
//!
//! ## Example
//!
//! ```ignore
//! use presence_cache::{RedisChangeBus, RedisPool, RedisPoolConfig, Publisher};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let publisher = Publisher::new(pool);
//! let bus = RedisChangeBus::new("redis://127.0.0.1:6379", 64)?;
//!
//! let mut changes = bus.subscribe("users_status", &RecordFilter::subject(id)).await?;
//! while let Some(event) = changes.next().await {
//!     // evaluate...
//! }
//! ```

pub mod local;
pub mod pool;
pub mod presence;
pub mod pubsub;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export presence types
pub use presence::PresenceCache;

// Re-export pubsub types
pub use pubsub::{ChangeChannel, Publisher, RedisChangeBus, CHANNEL_SEPARATOR};

pub use local::LocalChangeBus;

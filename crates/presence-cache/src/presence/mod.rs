//! Presence cache module.

mod presence_cache;

pub use presence_cache::PresenceCache;

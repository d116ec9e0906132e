//! Redis Pub/Sub module.
//!
//! Carries record change notifications between nodes.

mod channels;
mod publisher;
mod subscriber;

pub use channels::{ChangeChannel, CHANNEL_SEPARATOR};
pub use publisher::Publisher;
pub use subscriber::RedisChangeBus;

//! # presence-agent
//!
//! Wires the PostgreSQL record store and Redis change bus into a
//! [`presence_service::PresenceService`] and drives it from a line console.

pub mod console;
pub mod server;

pub use server::{create_service, run};

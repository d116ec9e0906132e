//! Integration test utilities for the presence subsystem
//!
//! This crate provides an in-process cluster (shared store and change bus,
//! one service per node) plus helpers for tests against live backends.

pub mod helpers;
pub mod fixtures;

pub use helpers::*;
pub use fixtures::*;

//! Model to entity mappers
//!
//! - `TryFrom<Model> for Entity`: convert database rows to domain objects,
//!   rejecting rows that violate domain invariants

mod status;

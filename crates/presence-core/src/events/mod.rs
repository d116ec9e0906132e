//! Change events delivered by the change bus

mod change_event;

pub use change_event::{ChangeEvent, ChangeKind};

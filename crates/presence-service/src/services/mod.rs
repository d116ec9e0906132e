//! Presence services
//!
//! Leaves first: the cancellation token and status probe, then the writer,
//! debouncer and subscription registry, and the `PresenceService` facade that
//! wires them together.

pub mod cancel;
pub mod context;
pub mod debouncer;
pub mod error;
pub mod notifying_store;
pub mod presence;
pub mod probe;
pub mod registry;
pub mod writer;

pub use cancel::CancelToken;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use debouncer::ActivityDebouncer;
pub use error::{ServiceError, ServiceResult};
pub use notifying_store::NotifyingStore;
pub use presence::PresenceService;
pub use probe::StatusProbe;
pub use registry::{SubscriptionHandle, SubscriptionRegistry, SubscriptionState};
pub use writer::{PresenceWriter, WriteOutcome};

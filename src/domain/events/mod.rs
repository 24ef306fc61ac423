pub mod publisher;
pub mod sync_events;

pub use publisher::{
    next_event, BroadcastEventPublisher, DynEventPublisher, EventPublisher, NoopEventPublisher,
};
pub use sync_events::{MutationKind, SyncEvent, SyncPhase};

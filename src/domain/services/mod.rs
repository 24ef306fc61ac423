pub mod background;
pub mod device_registration;
pub mod mutation;
pub mod notification_sync;
pub mod router;

pub use device_registration::DeviceRegistrationManager;
pub use mutation::{MutationOutcome, RollbackPolicy};
pub use notification_sync::{NotificationSyncEngine, SyncSnapshot, SyncState};
pub use router::{type_fallback, Navigator, NotificationRouter};

#[cfg(test)]
pub use router::MockNavigator;

pub mod notification_transport;
pub mod preferences_repository;
pub mod push_transport;

pub use notification_transport::{DynNotificationTransport, NotificationTransport};
pub use preferences_repository::{
    DynNotificationPreferencesRepository, NotificationPreferencesRepository,
};
pub use push_transport::{DynPushTransport, PushTransport};

#[cfg(test)]
pub use notification_transport::MockNotificationTransport;
#[cfg(test)]
pub use preferences_repository::MockNotificationPreferencesRepository;
#[cfg(test)]
pub use push_transport::MockPushTransport;

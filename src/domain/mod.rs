pub mod entities;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;

pub use entities::{
    CreateNotificationRequest, DeviceRegistration, NavigationTarget, Notification,
    NotificationPayload, NotificationPreferences, NotificationQuery, NotificationStats,
    NotificationType, RouteResolution, UserId,
};

pub use error::{DomainError, DomainResult};

pub use events::{BroadcastEventPublisher, DynEventPublisher, EventPublisher, SyncEvent, SyncPhase};

pub use repositories::{
    DynNotificationPreferencesRepository, DynNotificationTransport, DynPushTransport,
    NotificationPreferencesRepository, NotificationTransport, PushTransport,
};

pub use services::{
    DeviceRegistrationManager, MutationOutcome, Navigator, NotificationRouter,
    NotificationSyncEngine, SyncSnapshot,
};

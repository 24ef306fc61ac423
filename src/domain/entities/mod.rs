pub mod device_registration;
pub mod navigation;
pub mod notification;
pub mod notification_preferences;

pub use device_registration::DeviceRegistration;

pub use navigation::{
    FallbackReason, MessagesTab, NavigationTarget, NotificationPayload, OrderTab,
    RouteResolution, RouteValidationError, WalletTab,
};

pub use notification::{
    CreateNotificationRequest, Notification, NotificationCategory, NotificationId,
    NotificationPage, NotificationQuery, NotificationStats, NotificationType, UserId,
};

pub use notification_preferences::NotificationPreferences;

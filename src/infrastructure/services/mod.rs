pub mod http_notification_transport;
pub mod static_push_transport;

pub use http_notification_transport::HttpNotificationTransport;
pub use static_push_transport::StaticPushTransport;

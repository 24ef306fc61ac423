use crate::domain::{
    entities::{
        CreateNotificationRequest, DeviceRegistration, Notification, NotificationId,
        NotificationPage, UserId,
    },
    error::DomainResult,
};
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

/// Remote source of truth for notifications and device bindings.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn register_device(
        &self,
        user_id: UserId,
        device_token: String,
    ) -> DomainResult<DeviceRegistration>;
    async fn is_device_registered(&self, user_id: UserId) -> DomainResult<bool>;
    async fn clear_device_binding(&self, user_id: UserId) -> DomainResult<()>;

    async fn fetch_notifications(
        &self,
        user_id: UserId,
        page: u32,
        page_size: u32,
    ) -> DomainResult<NotificationPage>;
    async fn fetch_all_for_user(&self, user_id: UserId) -> DomainResult<Vec<Notification>>;

    async fn mark_read(&self, id: NotificationId) -> DomainResult<()>;
    async fn mark_all_read(&self, user_id: UserId) -> DomainResult<()>;
    async fn delete(&self, id: NotificationId) -> DomainResult<()>;
    async fn create(&self, request: CreateNotificationRequest) -> DomainResult<Notification>;

    /// Whether `mark_all_read` is a single atomic server call. When false the
    /// engine marks items one by one.
    fn supports_bulk_mark_read(&self) -> bool {
        true
    }
}

pub type DynNotificationTransport = Arc<dyn NotificationTransport>;

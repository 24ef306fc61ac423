use crate::domain::{entities::NotificationPreferences, error::DomainResult};
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationPreferencesRepository: Send + Sync {
    /// Stored preferences, or the defaults when nothing was saved yet.
    async fn load(&self) -> DomainResult<NotificationPreferences>;
    async fn save(&self, preferences: &NotificationPreferences) -> DomainResult<()>;
}

pub type DynNotificationPreferencesRepository = Arc<dyn NotificationPreferencesRepository>;

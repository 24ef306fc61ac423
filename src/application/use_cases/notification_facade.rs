use crate::domain::{
    entities::{
        CreateNotificationRequest, Notification, NotificationCategory, NotificationId,
        NotificationPayload, NotificationPreferences, NotificationQuery, NotificationStats,
        NotificationType, RouteResolution, UserId,
    },
    error::{DomainError, DomainResult},
    events::{BroadcastEventPublisher, EventPublisher, SyncEvent},
    repositories::DynNotificationPreferencesRepository,
    services::{
        DeviceRegistrationManager, MutationOutcome, Navigator, NotificationRouter,
        NotificationSyncEngine,
    },
};
use crate::infrastructure::config::SyncConfig;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

/// Everything a notifications screen renders, read in one go.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacadeSnapshot {
    pub user_id: Option<UserId>,
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
    pub stats: NotificationStats,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub is_loading_more: bool,
    pub error: Option<String>,
    pub has_more: bool,
    pub notifications_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChangeOutcome {
    pub user_id: Option<UserId>,
    pub registration_failed: bool,
    pub loaded: bool,
}

impl AuthChangeOutcome {
    fn logged_out() -> Self {
        Self {
            user_id: None,
            registration_failed: false,
            loaded: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HelperOutcome {
    Sent(Notification),
    /// Outbound alerts are switched off in preferences.
    Suppressed,
}

pub struct NotificationFacade {
    engine: Arc<NotificationSyncEngine>,
    registration: Arc<DeviceRegistrationManager>,
    preferences: DynNotificationPreferencesRepository,
    events: BroadcastEventPublisher,
    router: NotificationRouter,
    config: SyncConfig,
    notifications_enabled: AtomicBool,
    auth_lock: Mutex<()>,
}

impl NotificationFacade {
    /// Builds the facade and applies the persisted preference. A preference
    /// store that cannot be read leaves notifications enabled.
    pub async fn mount(
        engine: Arc<NotificationSyncEngine>,
        registration: Arc<DeviceRegistrationManager>,
        preferences: DynNotificationPreferencesRepository,
        events: BroadcastEventPublisher,
        config: SyncConfig,
    ) -> Self {
        let stored = match preferences.load().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to load notification preferences: {}", e);
                NotificationPreferences::default()
            }
        };
        debug!(
            "Mounted notification facade (enabled: {})",
            stored.notifications_enabled
        );

        Self {
            engine,
            registration,
            preferences,
            events,
            router: NotificationRouter::new(),
            config,
            notifications_enabled: AtomicBool::new(stored.allows_outbound()),
            auth_lock: Mutex::new(()),
        }
    }

    /// Reacts to sign-in (`Some`) and sign-out (`None`). Calls are
    /// serialized so a quick logout/login cannot interleave.
    pub async fn on_auth_changed(&self, user_id: Option<UserId>) -> AuthChangeOutcome {
        let _guard = self.auth_lock.lock().await;

        match user_id {
            Some(user_id) => self.login(user_id).await,
            None => {
                self.logout().await;
                AuthChangeOutcome::logged_out()
            }
        }
    }

    pub async fn on_focus(&self) -> bool {
        if self.engine.current_user().is_none() {
            return false;
        }
        self.engine.refresh().await
    }

    pub fn snapshot(&self) -> FacadeSnapshot {
        let snapshot = self.engine.snapshot();
        FacadeSnapshot {
            user_id: snapshot.user_id,
            unread_count: snapshot.stats.unread_count,
            stats: snapshot.stats,
            is_loading: snapshot.state.is_loading,
            is_refreshing: snapshot.state.is_refreshing,
            is_loading_more: snapshot.state.is_loading_more,
            error: snapshot.state.last_error,
            has_more: snapshot.state.has_more,
            notifications: snapshot.state.notifications,
            notifications_enabled: self.notifications_enabled(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled.load(Ordering::SeqCst)
    }

    pub fn registration(&self) -> &DeviceRegistrationManager {
        &self.registration
    }

    pub async fn fetch(&self, query: NotificationQuery) -> bool {
        self.engine.fetch(query).await
    }

    pub async fn refresh(&self) -> bool {
        self.engine.refresh().await
    }

    pub async fn load_more(&self) -> bool {
        self.engine.load_more().await
    }

    pub async fn mark_as_read(&self, id: NotificationId) -> MutationOutcome {
        self.engine.mark_as_read(id).await
    }

    pub async fn mark_all_as_read(&self) -> MutationOutcome {
        self.engine.mark_all_as_read().await
    }

    pub async fn delete(&self, id: NotificationId) -> MutationOutcome {
        self.engine.delete_notification(id).await
    }

    /// Sends `request` and refreshes the list once the server accepted it.
    /// A failed send leaves the list untouched.
    pub async fn create_notification(
        &self,
        request: CreateNotificationRequest,
    ) -> DomainResult<Notification> {
        let created = self.engine.create_notification(request).await?;
        if self.engine.current_user().is_some() && !self.engine.refresh().await {
            warn!(
                "Notification {} was sent but the list could not be refreshed",
                created.id
            );
        }
        Ok(created)
    }

    pub async fn send_booking_notification(
        &self,
        recipient: UserId,
        booking_id: u64,
        notification_type: NotificationType,
        title: &str,
        body: &str,
    ) -> DomainResult<HelperOutcome> {
        require_category(&notification_type, NotificationCategory::Booking)?;
        let request = CreateNotificationRequest::new(recipient, title, body, notification_type)
            .with_reference(booking_id);
        self.send_helper(request).await
    }

    pub async fn send_message_notification(
        &self,
        recipient: UserId,
        conversation_id: u64,
        sender_name: &str,
        preview: &str,
    ) -> DomainResult<HelperOutcome> {
        let request = CreateNotificationRequest::new(
            recipient,
            format!("New message from {}", sender_name),
            preview,
            NotificationType::NewMessage,
        )
        .with_reference(conversation_id);
        self.send_helper(request).await
    }

    pub async fn send_payment_notification(
        &self,
        recipient: UserId,
        payment_id: u64,
        notification_type: NotificationType,
        title: &str,
        body: &str,
    ) -> DomainResult<HelperOutcome> {
        require_category(&notification_type, NotificationCategory::Payment)?;
        let request = CreateNotificationRequest::new(recipient, title, body, notification_type)
            .with_reference(payment_id);
        self.send_helper(request).await
    }

    /// Persists the preference, then applies it. Nothing changes when the
    /// store rejects the write.
    pub async fn set_notification_enabled(&self, enabled: bool) -> DomainResult<()> {
        let preferences = NotificationPreferences {
            notifications_enabled: enabled,
        };
        self.preferences.save(&preferences).await?;
        self.notifications_enabled.store(enabled, Ordering::SeqCst);
        info!("Outbound notifications {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    pub fn resolve(&self, payload: &NotificationPayload) -> RouteResolution {
        self.router.resolve(payload)
    }

    pub fn dispatch(
        &self,
        payload: &NotificationPayload,
        navigator: &dyn Navigator,
    ) -> RouteResolution {
        self.router.dispatch(payload, navigator)
    }

    async fn login(&self, user_id: UserId) -> AuthChangeOutcome {
        let registered = self.registration.initialize_for_user(user_id, false).await;
        if !registered {
            error!("Device registration failed for user {}", user_id);
            if let Err(e) = self
                .events
                .publish_event(SyncEvent::device_registration_failed(user_id))
                .await
            {
                warn!("Failed to publish registration failure: {}", e);
            }
        }

        self.engine.set_user(user_id).await;
        let loaded = self
            .engine
            .fetch(NotificationQuery::first_page(self.config.page_size))
            .await;
        self.engine
            .start_auto_refresh(self.config.auto_refresh_interval);

        AuthChangeOutcome {
            user_id: Some(user_id),
            registration_failed: !registered,
            loaded,
        }
    }

    async fn logout(&self) {
        self.engine.stop_auto_refresh();
        self.engine.clear().await;
        self.registration.cleanup().await;
        info!("Notification session closed");
    }

    async fn send_helper(&self, request: CreateNotificationRequest) -> DomainResult<HelperOutcome> {
        if !self.notifications_enabled() {
            debug!(
                "Suppressing {} notification for user {}",
                request.notification_type, request.user_id
            );
            return Ok(HelperOutcome::Suppressed);
        }
        self.create_notification(request)
            .await
            .map(HelperOutcome::Sent)
    }
}

fn require_category(
    notification_type: &NotificationType,
    expected: NotificationCategory,
) -> DomainResult<()> {
    if notification_type.category() == expected {
        Ok(())
    } else {
        Err(DomainError::ValidationError(format!(
            "{} is not a {:?} notification",
            notification_type, expected
        )))
    }
}

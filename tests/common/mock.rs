use lenslink_notifications::domain::{
    entities::{
        CreateNotificationRequest, DeviceRegistration, NavigationTarget, Notification,
        NotificationId, NotificationPage, NotificationPreferences, UserId,
    },
    error::DomainResult,
    repositories::{NotificationPreferencesRepository, NotificationTransport, PushTransport},
    services::Navigator,
};

mockall::mock! {
    pub Transport {}
    #[async_trait::async_trait]
    impl NotificationTransport for Transport {
        async fn register_device(&self, user_id: UserId, device_token: String) -> DomainResult<DeviceRegistration>;
        async fn is_device_registered(&self, user_id: UserId) -> DomainResult<bool>;
        async fn clear_device_binding(&self, user_id: UserId) -> DomainResult<()>;
        async fn fetch_notifications(&self, user_id: UserId, page: u32, page_size: u32) -> DomainResult<NotificationPage>;
        async fn fetch_all_for_user(&self, user_id: UserId) -> DomainResult<Vec<Notification>>;
        async fn mark_read(&self, id: NotificationId) -> DomainResult<()>;
        async fn mark_all_read(&self, user_id: UserId) -> DomainResult<()>;
        async fn delete(&self, id: NotificationId) -> DomainResult<()>;
        async fn create(&self, request: CreateNotificationRequest) -> DomainResult<Notification>;
        fn supports_bulk_mark_read(&self) -> bool;
    }
}

mockall::mock! {
    pub Push {}
    #[async_trait::async_trait]
    impl PushTransport for Push {
        async fn device_token(&self) -> DomainResult<String>;
    }
}

mockall::mock! {
    pub Preferences {}
    #[async_trait::async_trait]
    impl NotificationPreferencesRepository for Preferences {
        async fn load(&self) -> DomainResult<NotificationPreferences>;
        async fn save(&self, preferences: &NotificationPreferences) -> DomainResult<()>;
    }
}

mockall::mock! {
    pub Navigator {}
    impl Navigator for Navigator {
        fn navigate(&self, target: &NavigationTarget);
        fn notify(&self, notice: &str);
    }
}

pub mod application;
pub mod domain;
pub mod infrastructure;

use application::NotificationFacade;
use domain::{
    error::DomainResult,
    events::BroadcastEventPublisher,
    repositories::{
        DynNotificationPreferencesRepository, DynNotificationTransport, DynPushTransport,
    },
    services::{DeviceRegistrationManager, NotificationSyncEngine},
};
use infrastructure::{
    AppConfig, HttpNotificationTransport, SqliteNotificationPreferencesRepository,
    StaticPushTransport,
};
use std::sync::Arc;
use tracing::info;

/// Wires the HTTP transport, push token source and on-disk preferences into
/// a mounted facade.
pub async fn bootstrap(config: &AppConfig) -> DomainResult<Arc<NotificationFacade>> {
    // Initialize transports
    let transport = Arc::new(HttpNotificationTransport::new(
        config.api_base_url.clone(),
        config.api_token.clone(),
    )?) as DynNotificationTransport;
    let push = Arc::new(StaticPushTransport::new(config.device_token.clone())) as DynPushTransport;

    // Initialize repositories
    let preferences = Arc::new(SqliteNotificationPreferencesRepository::new(
        &config.preferences_path,
    )?) as DynNotificationPreferencesRepository;

    let facade = assemble(transport, push, preferences, config).await;
    info!(
        "Notifications ready against {} (preferences at {})",
        config.api_base_url,
        config.preferences_path.display()
    );
    Ok(facade)
}

/// Builds the engine, registration manager and facade over any transport.
pub async fn assemble(
    transport: DynNotificationTransport,
    push: DynPushTransport,
    preferences: DynNotificationPreferencesRepository,
    config: &AppConfig,
) -> Arc<NotificationFacade> {
    let events = BroadcastEventPublisher::new(config.sync.event_buffer);

    // Initialize services
    let engine = Arc::new(NotificationSyncEngine::new(
        Arc::clone(&transport),
        Arc::new(events.clone()),
        config.sync.clone(),
    ));
    let registration = Arc::new(DeviceRegistrationManager::new(transport, push));

    Arc::new(
        NotificationFacade::mount(
            engine,
            registration,
            preferences,
            events,
            config.sync.clone(),
        )
        .await,
    )
}

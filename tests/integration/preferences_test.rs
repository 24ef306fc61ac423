use crate::common::{init, mock::MockPreferences, test_utils::*};
use anyhow::Result;
use lenslink_notifications::{
    application::HelperOutcome,
    assemble,
    domain::{
        entities::NotificationPreferences, error::DomainError,
        repositories::NotificationPreferencesRepository,
    },
    infrastructure::SqliteNotificationPreferencesRepository,
};
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn test_preference_survives_reopen() -> Result<()> {
    init();
    let dir = tempdir()?;
    let path = dir.path().join("preferences.db");

    let repo = SqliteNotificationPreferencesRepository::new(&path)?;
    repo.save(&NotificationPreferences::disabled()).await?;
    drop(repo);

    let reopened = SqliteNotificationPreferencesRepository::new(&path)?;
    assert!(!reopened.load().await?.notifications_enabled);
    Ok(())
}

#[tokio::test]
async fn test_facade_reads_preference_at_mount() -> Result<()> {
    init();
    let dir = tempdir()?;
    let path = dir.path().join("preferences.db");
    SqliteNotificationPreferencesRepository::new(&path)?
        .save(&NotificationPreferences::disabled())
        .await?;

    let server = Arc::new(FakeNotificationServer::new());
    let facade = assemble(
        server.clone(),
        Arc::new(FixedPush("device-1")),
        Arc::new(SqliteNotificationPreferencesRepository::new(&path)?),
        &create_test_config(),
    )
    .await;

    assert!(!facade.snapshot().notifications_enabled);
    let outcome = facade
        .send_message_notification(3, 1, "Ana", "Running late")
        .await?;
    assert_eq!(outcome, HelperOutcome::Suppressed);
    assert_eq!(server.count("create"), 0);
    Ok(())
}

#[tokio::test]
async fn test_unreadable_store_defaults_to_enabled() -> Result<()> {
    init();
    let mut preferences = MockPreferences::new();
    preferences
        .expect_load()
        .returning(|| Err(DomainError::InternalError("corrupt".to_string())));
    preferences.expect_save().times(1).returning(|_| Ok(()));

    let server = Arc::new(FakeNotificationServer::new());
    let facade = assemble(
        server,
        Arc::new(FixedPush("device-1")),
        Arc::new(preferences),
        &create_test_config(),
    )
    .await;

    assert!(facade.notifications_enabled());
    facade.set_notification_enabled(false).await?;
    assert!(!facade.notifications_enabled());
    Ok(())
}

use super::setup_test_env;
use crate::common::test_utils::*;
use anyhow::Result;
use lenslink_notifications::domain::{
    entities::{NotificationQuery, NotificationType},
    events::SyncEvent,
    services::MutationOutcome,
};
use std::sync::Arc;

/// User 7 owns three unread and two read notifications on the server.
fn server_for_user_seven() -> FakeNotificationServer {
    FakeNotificationServer::with_notifications(vec![
        create_test_notification(5, 7, false, NotificationType::NewBooking),
        create_test_notification(4, 7, false, NotificationType::NewMessage),
        create_test_notification(3, 7, true, NotificationType::PaymentReceived),
        create_test_notification(2, 7, false, NotificationType::BookingReminder),
        create_test_notification(1, 7, true, NotificationType::System),
    ])
}

async fn run_offline_mark_all(server: Arc<FakeNotificationServer>) -> Result<()> {
    let facade = create_test_facade(&server).await;
    let mut events = facade.subscribe();

    facade.on_auth_changed(Some(7)).await;
    assert!(facade.fetch(NotificationQuery::first_page(5)).await);
    let snapshot = facade.snapshot();
    assert_eq!(snapshot.notifications.len(), 5);
    assert_eq!(snapshot.unread_count, 3);

    server.set_offline(true);
    let outcome = facade.mark_all_as_read().await;

    assert!(matches!(outcome, MutationOutcome::Diverged { .. }));
    let snapshot = facade.snapshot();
    assert_eq!(snapshot.unread_count, 0);
    assert!(snapshot.notifications.iter().all(|n| n.read_status));
    assert!(snapshot.stats.is_consistent());
    assert_eq!(server.unread_on_server(7), 3);

    server.set_offline(false);
    assert!(facade.refresh().await);

    let snapshot = facade.snapshot();
    assert_eq!(snapshot.unread_count, 3);
    assert_eq!(
        snapshot.notifications.iter().filter(|n| !n.read_status).count(),
        3
    );
    assert_eq!(snapshot.error, None);

    let diverged = std::iter::from_fn(|| events.try_recv().ok())
        .any(|event| matches!(event, SyncEvent::MutationDiverged { .. }));
    assert!(diverged);

    facade.on_auth_changed(None).await;
    Ok(())
}

#[tokio::test]
async fn test_offline_mark_all_with_bulk_endpoint() -> Result<()> {
    setup_test_env();
    let server = Arc::new(server_for_user_seven());
    run_offline_mark_all(server.clone()).await?;
    assert_eq!(server.count("mark_all_read:7"), 1);
    assert_eq!(server.count("mark_read"), 0);
    Ok(())
}

#[tokio::test]
async fn test_offline_mark_all_item_by_item() -> Result<()> {
    setup_test_env();
    let server = Arc::new(server_for_user_seven().without_bulk_mark_read());
    run_offline_mark_all(server.clone()).await?;
    assert_eq!(server.count("mark_read:"), 3);
    assert_eq!(server.count("mark_all_read"), 0);
    Ok(())
}

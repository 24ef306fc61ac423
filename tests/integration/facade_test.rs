use crate::common::{init, test_utils::*};
use anyhow::Result;
use lenslink_notifications::domain::{
    entities::{NotificationPayload, NotificationType, RouteResolution},
    events::SyncEvent,
    services::MutationOutcome,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn seeded_server() -> Arc<FakeNotificationServer> {
    Arc::new(FakeNotificationServer::with_notifications(vec![
        create_test_notification(3, 7, false, NotificationType::NewBooking),
        create_test_notification(2, 7, true, NotificationType::PaymentReceived),
        create_test_notification(1, 9, false, NotificationType::NewMessage),
    ]))
}

#[tokio::test]
async fn test_login_registers_and_loads() -> Result<()> {
    init();
    let server = seeded_server();
    let facade = create_test_facade(&server).await;

    let outcome = facade.on_auth_changed(Some(7)).await;

    assert!(!outcome.registration_failed);
    assert!(outcome.loaded);
    let snapshot = facade.snapshot();
    assert_eq!(snapshot.user_id, Some(7));
    assert_eq!(snapshot.notifications.len(), 2);
    assert_eq!(snapshot.unread_count, 1);
    assert!(facade.registration().is_initialized());
    Ok(())
}

#[tokio::test]
async fn test_logout_clears_everything() -> Result<()> {
    init();
    let server = seeded_server();
    let facade = create_test_facade(&server).await;
    facade.on_auth_changed(Some(7)).await;

    facade.on_auth_changed(None).await;

    let snapshot = facade.snapshot();
    assert_eq!(snapshot.user_id, None);
    assert!(snapshot.notifications.is_empty());
    assert_eq!(snapshot.unread_count, 0);
    assert_eq!(server.count("clear:7"), 1);
    assert!(!facade.registration().is_initialized());
    Ok(())
}

#[tokio::test]
async fn test_switching_users_replaces_list() -> Result<()> {
    init();
    let server = seeded_server();
    let facade = create_test_facade(&server).await;

    facade.on_auth_changed(Some(7)).await;
    facade.on_auth_changed(Some(9)).await;

    let snapshot = facade.snapshot();
    assert_eq!(snapshot.user_id, Some(9));
    assert_eq!(
        snapshot.notifications.iter().map(|n| n.id).collect::<Vec<_>>(),
        vec![1]
    );
    let calls = server.calls();
    let clear_old = calls.iter().position(|c| c == "clear:7").unwrap();
    let register_new = calls.iter().position(|c| c == "register:9").unwrap();
    assert!(clear_old < register_new);
    Ok(())
}

#[tokio::test]
async fn test_registration_failure_is_alerted() -> Result<()> {
    init();
    let server = seeded_server();
    let facade = create_test_facade(&server).await;
    let mut events = facade.subscribe();
    server.set_offline(true);

    let outcome = facade.on_auth_changed(Some(7)).await;

    assert!(outcome.registration_failed);
    assert!(!outcome.loaded);
    assert!(facade.snapshot().error.is_some());
    let alerts: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
        .filter(SyncEvent::is_alert)
        .collect();
    assert!(matches!(
        alerts.as_slice(),
        [SyncEvent::DeviceRegistrationFailed { user_id: 7, .. }]
    ));
    Ok(())
}

#[tokio::test]
async fn test_helper_sends_then_refreshes() -> Result<()> {
    init();
    let server = seeded_server();
    let facade = create_test_facade(&server).await;
    facade.on_auth_changed(Some(7)).await;
    let fetches_before = server.count("fetch:7:1");

    let outcome = facade
        .send_booking_notification(
            7,
            55,
            NotificationType::BookingConfirmed,
            "Booking confirmed",
            "Saturday 10:00 with Ana",
        )
        .await?;

    let sent = match outcome {
        lenslink_notifications::application::HelperOutcome::Sent(sent) => sent,
        other => panic!("expected a sent notification, got {:?}", other),
    };
    assert_eq!(sent.reference_id.as_deref(), Some("55"));
    assert_eq!(server.count("fetch:7:1"), fetches_before + 1);
    let snapshot = facade.snapshot();
    assert_eq!(snapshot.notifications[0].id, sent.id);
    assert_eq!(snapshot.unread_count, 2);
    Ok(())
}

#[tokio::test]
async fn test_failed_send_leaves_list_untouched() -> Result<()> {
    init();
    let server = seeded_server();
    let facade = create_test_facade(&server).await;
    facade.on_auth_changed(Some(7)).await;
    let before = facade.snapshot();
    server.set_offline(true);

    let result = facade
        .send_payment_notification(
            7,
            12,
            NotificationType::PaymentReceived,
            "Payment received",
            "$120 for your session",
        )
        .await;

    assert!(result.is_err());
    assert_eq!(facade.snapshot(), before);
    Ok(())
}

#[tokio::test]
async fn test_commands_and_routing_delegate() -> Result<()> {
    init();
    let server = seeded_server();
    let facade = create_test_facade(&server).await;
    facade.on_auth_changed(Some(7)).await;

    assert_eq!(facade.mark_as_read(3).await, MutationOutcome::Applied);
    assert_eq!(facade.delete(2).await, MutationOutcome::Applied);
    assert!(facade.on_focus().await);
    assert_eq!(facade.snapshot().notifications.len(), 1);
    assert_eq!(facade.snapshot().unread_count, 0);

    let resolution = facade.resolve(&NotificationPayload::for_type(NotificationType::NewMessage));
    assert!(matches!(resolution, RouteResolution::Fallback { .. }));
    Ok(())
}

use crate::common::{init, mock::MockTransport, test_utils::*};
use anyhow::Result;
use futures::future::join_all;
use lenslink_notifications::domain::{
    entities::DeviceRegistration, error::DomainError, services::DeviceRegistrationManager,
};
use mockall::predicate::eq;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_concurrent_initialization_registers_once() -> Result<()> {
    init();
    let server =
        Arc::new(FakeNotificationServer::new().with_latency(Duration::from_millis(20)));
    let manager = create_test_registration(&server);

    let results = join_all((0..5).map(|_| manager.initialize_for_user(42, false))).await;

    assert!(results.into_iter().all(|ok| ok));
    assert_eq!(server.count("register:42"), 1);
    assert_eq!(server.count("is_registered:42"), 1);
    assert_eq!(manager.current_user_id(), Some(42));
    Ok(())
}

#[tokio::test]
async fn test_user_switch_clears_old_binding_before_registering_new() -> Result<()> {
    init();
    let server = Arc::new(FakeNotificationServer::new());
    let manager = create_test_registration(&server);

    assert!(manager.initialize_for_user(1, false).await);
    assert!(manager.initialize_for_user(2, false).await);

    let calls = server.calls();
    let clear_old = calls.iter().position(|c| c == "clear:1").unwrap();
    let register_new = calls.iter().position(|c| c == "register:2").unwrap();
    assert!(clear_old < register_new, "unexpected order: {:?}", calls);
    assert_eq!(manager.current_user_id(), Some(2));
    Ok(())
}

#[tokio::test]
async fn test_switch_during_flight_supersedes_previous_user() -> Result<()> {
    init();
    let server =
        Arc::new(FakeNotificationServer::new().with_latency(Duration::from_millis(10)));
    let manager = create_test_registration(&server);

    let (first, second) = tokio::join!(
        manager.initialize_for_user(1, false),
        manager.initialize_for_user(2, false)
    );

    assert!(!first, "superseded flight must not report success");
    assert!(second);
    assert_eq!(manager.current_user_id(), Some(2));

    let calls = server.calls();
    let register_old = calls.iter().position(|c| c == "register:1").unwrap();
    let clear_old = calls.iter().position(|c| c == "clear:1").unwrap();
    let register_new = calls.iter().position(|c| c == "register:2").unwrap();
    assert!(register_old < clear_old && clear_old < register_new, "{:?}", calls);
    Ok(())
}

#[tokio::test]
async fn test_failure_then_retry_against_mock() -> Result<()> {
    init();
    let mut transport = MockTransport::new();
    let mut attempts = 0;
    transport
        .expect_is_device_registered()
        .with(eq(8))
        .times(2)
        .returning(move |_| {
            attempts += 1;
            if attempts == 1 {
                Err(DomainError::TransportError("offline".to_string()))
            } else {
                Ok(false)
            }
        });
    transport
        .expect_register_device()
        .times(1)
        .returning(|user_id, token| Ok(DeviceRegistration::new(user_id, token)));

    let manager =
        DeviceRegistrationManager::new(Arc::new(transport), Arc::new(FixedPush("device-9")));

    assert!(!manager.initialize_for_user(8, false).await);
    assert!(!manager.is_initialized());
    assert!(manager.initialize_for_user(8, false).await);
    assert_eq!(
        manager.registration().map(|r| r.device_token),
        Some("device-9".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_cleanup_forgets_server_binding() -> Result<()> {
    init();
    let server = Arc::new(FakeNotificationServer::new());
    let manager = create_test_registration(&server);

    assert!(manager.initialize_for_user(5, false).await);
    manager.cleanup().await;
    manager.cleanup().await;

    assert_eq!(server.count("clear:5"), 1);
    assert_eq!(manager.current_user_id(), None);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_reinit_during_cleanup_waits_for_unbinding() -> Result<()> {
    init();
    let server =
        Arc::new(FakeNotificationServer::new().with_latency(Duration::from_millis(30)));
    let manager = Arc::new(create_test_registration(&server));

    let first = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.initialize_for_user(1, false).await }
    });
    tokio::time::sleep(Duration::from_millis(5)).await;
    let cleanup = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.cleanup().await }
    });
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(!manager.is_initializing());
    let second = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.initialize_for_user(1, false).await }
    });

    let first = first.await?;
    cleanup.await?;
    let second = second.await?;

    assert!(!first, "registration interrupted by cleanup must not report success");
    assert!(second);
    assert!(manager.is_initialized());
    assert_eq!(manager.current_user_id(), Some(1));
    assert_eq!(
        server.calls(),
        vec![
            "is_registered:1",
            "register:1",
            "clear:1",
            "is_registered:1",
            "register:1",
        ]
    );
    Ok(())
}

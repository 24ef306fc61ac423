use crate::common::{init, mock::MockNavigator};
use lenslink_notifications::domain::{
    entities::{
        FallbackReason, MessagesTab, NavigationTarget, NotificationPayload, OrderTab,
        RouteResolution, RouteValidationError,
    },
    services::NotificationRouter,
};
use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use test_case::test_case;

fn push_data(raw: &str) -> NotificationPayload {
    serde_json::from_str(raw).expect("valid push data")
}

#[test_case(r#"{"screen":"ChatScreen","conversationId":"77","type":"NEW_MESSAGE"}"#,
    RouteResolution::Navigate(NavigationTarget::Conversation { conversation_id: 77 }) ; "chat from string id")]
#[test_case(r#"{"type":"BOOKING_COMPLETED","bookingId":5}"#,
    RouteResolution::Fallback {
        target: NavigationTarget::OrderManagement { tab: OrderTab::Completed },
        reason: FallbackReason::MissingScreen,
    } ; "missing screen falls back by type")]
#[test_case(r#"{"screen":"MessagesScreen","tab":"spam"}"#,
    RouteResolution::Fallback {
        target: NavigationTarget::Messages { tab: MessagesTab::Inbox },
        reason: FallbackReason::UnknownTab { screen: "MessagesScreen".to_string(), tab: "spam".to_string() },
    } ; "unknown tab")]
#[test_case(r#"{"screen":"PhotographerDetailScreen","photographerId":"x1"}"#,
    RouteResolution::Invalid(RouteValidationError::InvalidParameter {
        screen: "PhotographerDetailScreen".to_string(),
        parameter: "photographerId",
        value: "\"x1\"".to_string(),
    }) ; "invalid photographer id")]
#[test_case(r#"{"screen":"PaymentDetailScreen"}"#,
    RouteResolution::Invalid(RouteValidationError::MissingParameter {
        screen: "PaymentDetailScreen".to_string(),
        parameter: "paymentId",
    }) ; "missing payment id")]
fn test_push_data_resolution(raw: &str, expected: RouteResolution) {
    init();
    assert_eq!(NotificationRouter::new().resolve(&push_data(raw)), expected);
}

#[test]
fn test_dispatch_acknowledges_unknown_payload() {
    init();
    let mut navigator = MockNavigator::new();
    navigator.expect_navigate().times(0);
    navigator
        .expect_notify()
        .with(eq("You have a new notification"))
        .times(1)
        .return_const(());

    let resolution =
        NotificationRouter::new().dispatch(&push_data(r#"{"screen":"GoneScreen"}"#), &navigator);

    assert!(matches!(resolution, RouteResolution::Acknowledge { .. }));
}

#[test]
fn test_dispatch_fallback_navigates_once() {
    init();
    let mut navigator = MockNavigator::new();
    navigator
        .expect_navigate()
        .with(eq(NavigationTarget::Messages {
            tab: MessagesTab::Inbox,
        }))
        .times(1)
        .return_const(());
    navigator.expect_notify().times(0);

    NotificationRouter::new().dispatch(
        &push_data(r#"{"screen":"OldChat","type":"NEW_MESSAGE"}"#),
        &navigator,
    );
}

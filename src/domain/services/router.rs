use crate::domain::entities::{
    FallbackReason, MessagesTab, NavigationTarget, NotificationCategory, NotificationPayload,
    NotificationType, OrderTab, RouteResolution, RouteValidationError, WalletTab,
};
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, info, warn};

#[cfg(test)]
use mockall::automock;

const DEFAULT_NOTICE: &str = "You have a new notification";

/// The UI side of routing: either moves to a screen or shows a notice.
#[cfg_attr(test, automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &NavigationTarget);
    fn notify(&self, notice: &str);
}

/// Turns a notification payload into exactly one navigation decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationRouter;

impl NotificationRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, payload: &NotificationPayload) -> RouteResolution {
        let Some(screen) = payload.screen.as_deref().map(str::trim) else {
            return self.fallback(payload, FallbackReason::MissingScreen);
        };
        if screen.is_empty() {
            return self.fallback(payload, FallbackReason::MissingScreen);
        }

        let resolved = match screen {
            "BookingDetailScreen" => detail(payload, screen, "bookingId")
                .map(|booking_id| NavigationTarget::BookingDetail { booking_id }),
            "ChatScreen" => detail(payload, screen, "conversationId")
                .map(|conversation_id| NavigationTarget::Conversation { conversation_id }),
            "PaymentDetailScreen" => detail(payload, screen, "paymentId")
                .map(|payment_id| NavigationTarget::PaymentDetail { payment_id }),
            "PhotographerDetailScreen" => detail(payload, screen, "photographerId")
                .map(|photographer_id| NavigationTarget::PhotographerProfile { photographer_id }),
            "OrderManagementScreen" => {
                return tabbed(payload, screen, |tab: OrderTab| {
                    NavigationTarget::OrderManagement { tab }
                })
            }
            "WalletScreen" => {
                return tabbed(payload, screen, |tab: WalletTab| NavigationTarget::Wallet {
                    tab,
                })
            }
            "MessagesScreen" => {
                return tabbed(payload, screen, |tab: MessagesTab| NavigationTarget::Messages {
                    tab,
                })
            }
            "NotificationsScreen" => Ok(NavigationTarget::Notifications),
            "HomeScreen" => Ok(NavigationTarget::Home),
            other => {
                return self.fallback(payload, FallbackReason::UnknownScreen(other.to_string()))
            }
        };

        match resolved {
            Ok(target) => RouteResolution::Navigate(target),
            Err(error) => {
                warn!("Rejecting notification route: {}", error);
                RouteResolution::Invalid(error)
            }
        }
    }

    /// Resolves `payload` and performs exactly one navigator call.
    pub fn dispatch(
        &self,
        payload: &NotificationPayload,
        navigator: &dyn Navigator,
    ) -> RouteResolution {
        let resolution = self.resolve(payload);
        match &resolution {
            RouteResolution::Navigate(target) | RouteResolution::Fallback { target, .. } => {
                info!("Routing notification to {}", target.screen_name());
                navigator.navigate(target);
            }
            RouteResolution::Invalid(error) => navigator.notify(&error.notice()),
            RouteResolution::Acknowledge { notice } => navigator.notify(notice),
        }
        resolution
    }

    fn fallback(&self, payload: &NotificationPayload, reason: FallbackReason) -> RouteResolution {
        match payload.notification_type.as_ref().and_then(type_fallback) {
            Some(target) => {
                debug!("Falling back to {} ({:?})", target.screen_name(), reason);
                RouteResolution::Fallback { target, reason }
            }
            None => RouteResolution::Acknowledge {
                notice: DEFAULT_NOTICE.to_string(),
            },
        }
    }
}

/// Section a notification type lands on when the payload names no usable
/// screen.
pub fn type_fallback(notification_type: &NotificationType) -> Option<NavigationTarget> {
    let target = match notification_type.category() {
        NotificationCategory::Booking => NavigationTarget::OrderManagement {
            tab: booking_tab(notification_type),
        },
        NotificationCategory::Message => NavigationTarget::Messages {
            tab: MessagesTab::Inbox,
        },
        NotificationCategory::Payment => NavigationTarget::Wallet {
            tab: match notification_type {
                NotificationType::PayoutSent => WalletTab::Payouts,
                _ => WalletTab::Transactions,
            },
        },
        NotificationCategory::General => return None,
    };
    Some(target)
}

fn booking_tab(notification_type: &NotificationType) -> OrderTab {
    match notification_type {
        NotificationType::NewBooking => OrderTab::Pending,
        NotificationType::BookingConfirmed | NotificationType::BookingReminder => {
            OrderTab::Confirmed
        }
        NotificationType::BookingCompleted => OrderTab::Completed,
        NotificationType::BookingCancelled => OrderTab::Cancelled,
        _ => OrderTab::All,
    }
}

fn detail(
    payload: &NotificationPayload,
    screen: &str,
    parameter: &'static str,
) -> Result<u64, RouteValidationError> {
    let value = payload
        .param(parameter)
        .filter(|value| !value.is_null())
        .ok_or_else(|| RouteValidationError::MissingParameter {
            screen: screen.to_string(),
            parameter,
        })?;

    parse_id(value).ok_or_else(|| RouteValidationError::InvalidParameter {
        screen: screen.to_string(),
        parameter,
        value: value.to_string(),
    })
}

/// Accepts a JSON number or numeric string holding a positive integer.
fn parse_id(value: &Value) -> Option<u64> {
    let id = match value {
        Value::Number(number) => number.as_u64(),
        Value::String(raw) => raw.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    (id > 0).then_some(id)
}

fn tabbed<T>(
    payload: &NotificationPayload,
    screen: &str,
    build: impl Fn(T) -> NavigationTarget,
) -> RouteResolution
where
    T: FromStr + Default,
{
    // A tab that is present but not a string is treated as unknown.
    let requested = match payload.param("tab") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => Some(raw.clone()),
        Some(other) => Some(other.to_string()),
    };
    match requested {
        None => RouteResolution::Navigate(build(T::default())),
        Some(raw) => match raw.parse::<T>() {
            Ok(tab) => RouteResolution::Navigate(build(tab)),
            Err(_) => RouteResolution::Fallback {
                target: build(T::default()),
                reason: FallbackReason::UnknownTab {
                    screen: screen.to_string(),
                    tab: raw,
                },
            },
        },
    }
}

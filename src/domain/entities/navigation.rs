use super::notification::NotificationType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Data attached to a received push or local notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub notification_type: Option<NotificationType>,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl NotificationPayload {
    pub fn for_type(notification_type: NotificationType) -> Self {
        Self {
            notification_type: Some(notification_type),
            ..Self::default()
        }
    }

    pub fn for_screen(screen: impl Into<String>) -> Self {
        Self {
            screen: Some(screen.into()),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, notification_type: NotificationType) -> Self {
        self.notification_type = Some(notification_type);
        self
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

macro_rules! tab_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ALL[0]
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|tab| tab.as_str() == wanted)
                    .ok_or(())
            }
        }
    };
}

tab_enum!(OrderTab {
    All => "all",
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
});

tab_enum!(WalletTab {
    Overview => "overview",
    Transactions => "transactions",
    Payouts => "payouts",
});

tab_enum!(MessagesTab {
    Inbox => "inbox",
    Archived => "archived",
});

/// Where the app should go for a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "camelCase")]
pub enum NavigationTarget {
    BookingDetail { booking_id: u64 },
    Conversation { conversation_id: u64 },
    PaymentDetail { payment_id: u64 },
    PhotographerProfile { photographer_id: u64 },
    OrderManagement { tab: OrderTab },
    Messages { tab: MessagesTab },
    Wallet { tab: WalletTab },
    Notifications,
    Home,
}

impl NavigationTarget {
    pub fn screen_name(&self) -> &'static str {
        match self {
            NavigationTarget::BookingDetail { .. } => "BookingDetailScreen",
            NavigationTarget::Conversation { .. } => "ChatScreen",
            NavigationTarget::PaymentDetail { .. } => "PaymentDetailScreen",
            NavigationTarget::PhotographerProfile { .. } => "PhotographerDetailScreen",
            NavigationTarget::OrderManagement { .. } => "OrderManagementScreen",
            NavigationTarget::Messages { .. } => "MessagesScreen",
            NavigationTarget::Wallet { .. } => "WalletScreen",
            NavigationTarget::Notifications => "NotificationsScreen",
            NavigationTarget::Home => "HomeScreen",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    MissingScreen,
    UnknownScreen(String),
    UnknownTab { screen: String, tab: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteValidationError {
    #[error("{screen} requires '{parameter}'")]
    MissingParameter {
        screen: String,
        parameter: &'static str,
    },

    #[error("{screen} got invalid '{parameter}': {value}")]
    InvalidParameter {
        screen: String,
        parameter: &'static str,
        value: String,
    },
}

impl RouteValidationError {
    /// One-line text suitable for a user-facing notice.
    pub fn notice(&self) -> String {
        "This notification points to something we couldn't open.".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteResolution {
    Navigate(NavigationTarget),
    Fallback {
        target: NavigationTarget,
        reason: FallbackReason,
    },
    Invalid(RouteValidationError),
    Acknowledge { notice: String },
}

impl RouteResolution {
    pub fn target(&self) -> Option<&NavigationTarget> {
        match self {
            RouteResolution::Navigate(target) | RouteResolution::Fallback { target, .. } => {
                Some(target)
            }
            RouteResolution::Invalid(_) | RouteResolution::Acknowledge { .. } => None,
        }
    }
}

impl fmt::Display for RouteResolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RouteResolution::Navigate(target) => write!(f, "navigate {}", target.screen_name()),
            RouteResolution::Fallback { target, reason } => {
                write!(f, "fallback {} ({:?})", target.screen_name(), reason)
            }
            RouteResolution::Invalid(error) => write!(f, "invalid: {}", error),
            RouteResolution::Acknowledge { notice } => write!(f, "acknowledge: {}", notice),
        }
    }
}

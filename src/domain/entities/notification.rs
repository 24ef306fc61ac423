use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;
use validator::Validate;

pub type NotificationId = i64;
pub type UserId = i64;

/// Server-defined notification kind. Unknown wire values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationType {
    NewBooking,
    BookingConfirmed,
    BookingCancelled,
    BookingCompleted,
    BookingReminder,
    NewMessage,
    PaymentReceived,
    PaymentFailed,
    PayoutSent,
    NewReview,
    System,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Booking,
    Message,
    Payment,
    General,
}

impl NotificationType {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationType::NewBooking => "NEW_BOOKING",
            NotificationType::BookingConfirmed => "BOOKING_CONFIRMED",
            NotificationType::BookingCancelled => "BOOKING_CANCELLED",
            NotificationType::BookingCompleted => "BOOKING_COMPLETED",
            NotificationType::BookingReminder => "BOOKING_REMINDER",
            NotificationType::NewMessage => "NEW_MESSAGE",
            NotificationType::PaymentReceived => "PAYMENT_RECEIVED",
            NotificationType::PaymentFailed => "PAYMENT_FAILED",
            NotificationType::PayoutSent => "PAYOUT_SENT",
            NotificationType::NewReview => "NEW_REVIEW",
            NotificationType::System => "SYSTEM",
            NotificationType::Other(s) => s,
        }
    }

    pub fn category(&self) -> NotificationCategory {
        match self {
            NotificationType::NewBooking
            | NotificationType::BookingConfirmed
            | NotificationType::BookingCancelled
            | NotificationType::BookingCompleted
            | NotificationType::BookingReminder => NotificationCategory::Booking,
            NotificationType::NewMessage => NotificationCategory::Message,
            NotificationType::PaymentReceived
            | NotificationType::PaymentFailed
            | NotificationType::PayoutSent => NotificationCategory::Payment,
            NotificationType::NewReview
            | NotificationType::System
            | NotificationType::Other(_) => NotificationCategory::General,
        }
    }
}

impl From<String> for NotificationType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "NEW_BOOKING" => NotificationType::NewBooking,
            "BOOKING_CONFIRMED" => NotificationType::BookingConfirmed,
            "BOOKING_CANCELLED" => NotificationType::BookingCancelled,
            "BOOKING_COMPLETED" => NotificationType::BookingCompleted,
            "BOOKING_REMINDER" => NotificationType::BookingReminder,
            "NEW_MESSAGE" => NotificationType::NewMessage,
            "PAYMENT_RECEIVED" => NotificationType::PaymentReceived,
            "PAYMENT_FAILED" => NotificationType::PaymentFailed,
            "PAYOUT_SENT" => NotificationType::PayoutSent,
            "NEW_REVIEW" => NotificationType::NewReview,
            "SYSTEM" => NotificationType::System,
            _ => NotificationType::Other(value),
        }
    }
}

impl From<&str> for NotificationType {
    fn from(value: &str) -> Self {
        NotificationType::from(value.to_string())
    }
}

impl From<NotificationType> for String {
    fn from(value: NotificationType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub read_status: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        id: NotificationId,
        user_id: UserId,
        title: String,
        body: String,
        notification_type: NotificationType,
    ) -> Self {
        Self {
            id,
            user_id,
            title,
            body,
            notification_type,
            reference_id: None,
            read_status: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_unread(&self) -> bool {
        !self.read_status
    }

    /// Takes the mutable fields of a later copy of the same notification.
    /// `id`, `user_id`, `created_at` and `notification_type` never change
    /// once seen.
    pub fn merge_from(&mut self, newer: Notification) {
        if newer.user_id != self.user_id
            || newer.created_at != self.created_at
            || newer.notification_type != self.notification_type
        {
            warn!(
                "Ignoring immutable field changes for notification {}",
                self.id
            );
        }
        self.title = newer.title;
        self.body = newer.body;
        self.reference_id = newer.reference_id;
        self.read_status = newer.read_status;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub page: u32,
    pub has_more: bool,
    pub total_count: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[validate(range(min = 1, message = "Page must be greater than 0"))]
    pub page: u32,
    #[validate(range(
        min = 1,
        max = 100,
        message = "Items per page must be between 1 and 100"
    ))]
    pub page_size: u32,
}

impl NotificationQuery {
    pub fn first_page(page_size: u32) -> Self {
        Self { page: 1, page_size }
    }
}

impl Default for NotificationQuery {
    fn default() -> Self {
        Self::first_page(20)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
    pub total_count: u64,
    pub unread_count: u64,
    pub read_count: u64,
    pub type_breakdown: BTreeMap<NotificationType, u64>,
}

impl NotificationStats {
    pub fn from_notifications(notifications: &[Notification]) -> Self {
        let mut stats = Self::default();
        for notification in notifications {
            stats.total_count += 1;
            if notification.read_status {
                stats.read_count += 1;
            } else {
                stats.unread_count += 1;
            }
            *stats
                .type_breakdown
                .entry(notification.notification_type.clone())
                .or_insert(0) += 1;
        }
        stats
    }

    pub fn is_consistent(&self) -> bool {
        self.unread_count + self.read_count == self.total_count
    }

    /// Moves one notification from unread to read. Returns false when there
    /// was nothing left to move.
    pub fn record_read(&mut self) -> bool {
        if self.unread_count == 0 {
            return false;
        }
        self.unread_count -= 1;
        self.read_count += 1;
        true
    }

    pub fn record_unread(&mut self) -> bool {
        if self.read_count == 0 {
            return false;
        }
        self.read_count -= 1;
        self.unread_count += 1;
        true
    }

    pub fn record_all_read(&mut self) {
        self.read_count = self.total_count;
        self.unread_count = 0;
    }

    pub fn record_removed(&mut self, notification: &Notification) {
        if self.total_count == 0 {
            return;
        }
        if notification.read_status {
            if self.read_count == 0 {
                return;
            }
            self.read_count -= 1;
        } else {
            if self.unread_count == 0 {
                return;
            }
            self.unread_count -= 1;
        }
        self.total_count -= 1;
        if let Some(count) = self
            .type_breakdown
            .get_mut(&notification.notification_type)
        {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.type_breakdown.remove(&notification.notification_type);
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    #[validate(range(min = 1, message = "User id must be positive"))]
    pub user_id: UserId,
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be between 1 and 200 characters"
    ))]
    pub title: String,
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Body must be between 1 and 2000 characters"
    ))]
    pub body: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub reference_id: Option<String>,
}

impl CreateNotificationRequest {
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        body: impl Into<String>,
        notification_type: NotificationType,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            body: body.into(),
            notification_type,
            reference_id: None,
        }
    }

    pub fn with_reference(mut self, reference_id: impl ToString) -> Self {
        self.reference_id = Some(reference_id.to_string());
        self
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{NotificationId, UserId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Loading,
    Loaded,
    Refreshing,
    LoadingMore,
    Errored,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MutationKind {
    MarkRead,
    MarkAllRead,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SyncEvent {
    StateChanged {
        phase: SyncPhase,
        changed_at: DateTime<Utc>,
    },
    StatsUpdated {
        total_count: u64,
        unread_count: u64,
    },
    MutationRolledBack {
        kind: MutationKind,
        notification_id: NotificationId,
        error: String,
    },
    MutationDiverged {
        kind: MutationKind,
        failed_ids: Vec<NotificationId>,
        error: String,
    },
    /// Consecutive optimistic writes failed; worth telling the user.
    RepeatedMutationFailure {
        failures: u32,
        last_error: String,
    },
    DeviceRegistrationFailed {
        user_id: UserId,
        failed_at: DateTime<Utc>,
    },
}

impl SyncEvent {
    pub fn state_changed(phase: SyncPhase) -> Self {
        Self::StateChanged {
            phase,
            changed_at: Utc::now(),
        }
    }

    pub fn device_registration_failed(user_id: UserId) -> Self {
        Self::DeviceRegistrationFailed {
            user_id,
            failed_at: Utc::now(),
        }
    }

    /// Events the UI should surface as an alert rather than silently.
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            SyncEvent::RepeatedMutationFailure { .. } | SyncEvent::DeviceRegistrationFailed { .. }
        )
    }
}

use super::notification::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binding of this client instance to a user account for push delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistration {
    pub user_id: UserId,
    pub device_token: String,
    pub registered_at: DateTime<Utc>,
}

impl DeviceRegistration {
    pub fn new(user_id: UserId, device_token: String) -> Self {
        Self {
            user_id,
            device_token,
            registered_at: Utc::now(),
        }
    }
}

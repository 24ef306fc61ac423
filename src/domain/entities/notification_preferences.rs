use serde::{Deserialize, Serialize};

/// Per-installation notification settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub notifications_enabled: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
        }
    }
}

impl NotificationPreferences {
    pub fn disabled() -> Self {
        Self {
            notifications_enabled: false,
        }
    }

    /// Outbound helper alerts are only attempted while enabled.
    pub fn allows_outbound(&self) -> bool {
        self.notifications_enabled
    }
}

use crate::domain::{
    entities::NotificationPreferences,
    error::{DomainError, DomainResult},
    repositories::NotificationPreferencesRepository,
};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const NOTIFICATIONS_ENABLED_KEY: &str = "notifications_enabled";

/// Installation-wide preferences in a small key-value table.
#[derive(Debug, Clone)]
pub struct SqliteNotificationPreferencesRepository {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteNotificationPreferencesRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> DomainResult<Self> {
        let connection = Connection::open(path)
            .map_err(|e| DomainError::InternalError(format!("Failed to open database: {}", e)))?;
        Self::with_connection(connection)
    }

    pub fn in_memory() -> DomainResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(connection: Connection) -> DomainResult<Self> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        let conn = self.connection.lock().await;
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> DomainResult<()> {
        let conn = self.connection.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO preferences (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[async_trait]
impl NotificationPreferencesRepository for SqliteNotificationPreferencesRepository {
    async fn load(&self) -> DomainResult<NotificationPreferences> {
        let notifications_enabled = match self.get(NOTIFICATIONS_ENABLED_KEY).await? {
            Some(raw) => raw.parse::<bool>().unwrap_or_else(|_| {
                warn!("Ignoring malformed stored preference {:?}", raw);
                true
            }),
            None => true,
        };

        Ok(NotificationPreferences {
            notifications_enabled,
        })
    }

    async fn save(&self, preferences: &NotificationPreferences) -> DomainResult<()> {
        self.put(
            NOTIFICATIONS_ENABLED_KEY,
            &preferences.notifications_enabled.to_string(),
        )
        .await?;
        debug!(
            "Saved notifications_enabled = {}",
            preferences.notifications_enabled
        );
        Ok(())
    }
}

use super::env::{get_env_opt, get_env_or, get_env_parse};
use crate::domain::error::{DomainError, DomainResult};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub page_size: u32,
    pub auto_refresh_interval: Duration,
    pub stats_cache_capacity: u64,
    pub stats_cache_ttl: Duration,
    /// Consecutive failed optimistic writes before the UI is alerted.
    pub repeated_failure_threshold: u32,
    pub event_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            auto_refresh_interval: Duration::from_secs(30),
            stats_cache_capacity: 16,
            stats_cache_ttl: Duration::from_secs(60),
            repeated_failure_threshold: 3,
            event_buffer: 64,
        }
    }
}

impl SyncConfig {
    pub fn with_page_size(page_size: u32) -> Self {
        let mut config = Self::default();
        config.page_size = page_size.clamp(1, 100);
        config
    }

    pub fn with_auto_refresh(interval: Duration) -> Self {
        let mut config = Self::default();
        config.auto_refresh_interval = interval;
        config
    }

    pub fn with_stats_cache(capacity: u64, ttl: Duration) -> Self {
        let mut config = Self::default();
        config.stats_cache_capacity = capacity;
        config.stats_cache_ttl = ttl;
        config
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub device_token: Option<String>,
    pub preferences_path: PathBuf,
    pub sync: SyncConfig,
}

impl AppConfig {
    /// Reads `LENSLINK_*` variables; call `dotenv` first to pick up a `.env`.
    pub fn from_env() -> DomainResult<Self> {
        let preferences_path = match get_env_opt("LENSLINK_PREFERENCES_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_preferences_path()?,
        };

        let mut sync = SyncConfig::with_page_size(get_env_parse("LENSLINK_PAGE_SIZE", 20));
        sync.auto_refresh_interval =
            Duration::from_secs(get_env_parse("LENSLINK_REFRESH_SECS", 30));

        Ok(Self {
            api_base_url: get_env_or("LENSLINK_API_URL", "http://localhost:3000/api"),
            api_token: get_env_opt("LENSLINK_API_TOKEN"),
            device_token: get_env_opt("LENSLINK_DEVICE_TOKEN"),
            preferences_path,
            sync,
        })
    }
}

fn default_preferences_path() -> DomainResult<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "lenslink", "notifications")
        .ok_or_else(|| DomainError::InternalError("No home directory available".to_string()))?;
    let data_dir = dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;
    Ok(data_dir.join("preferences.db"))
}

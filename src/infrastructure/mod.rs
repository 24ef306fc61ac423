pub mod config;
pub mod env;
pub mod repositories;
pub mod services;

pub use config::{AppConfig, SyncConfig};
pub use repositories::SqliteNotificationPreferencesRepository;
pub use services::{HttpNotificationTransport, StaticPushTransport};

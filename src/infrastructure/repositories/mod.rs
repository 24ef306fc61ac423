pub mod sqlite_preferences_repository;

pub use sqlite_preferences_repository::SqliteNotificationPreferencesRepository;

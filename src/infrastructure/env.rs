use std::{env, str::FromStr};
use tracing::warn;

/// Returns the value of an environment variable, treating empty values as unset.
pub fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Returns the value of an environment variable or a default value if not found.
///
/// # Arguments
///
/// * `key` - The environment variable name to look up
/// * `default` - The default value to return if variable is not found
pub fn get_env_or(key: &str, default: &str) -> String {
    get_env_opt(key).unwrap_or_else(|| default.to_string())
}

/// Parses an environment variable, falling back to `default` when it is
/// missing or malformed.
pub fn get_env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match get_env_opt(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring malformed value for {}: {:?}", key, raw);
            default
        }),
        None => default,
    }
}

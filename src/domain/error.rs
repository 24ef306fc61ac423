use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found error: {0}")]
    NotFoundError(String),

    #[error("Unauthorized error: {0}")]
    UnauthorizedError(String),

    #[error("Conflict error: {0}")]
    ConflictError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Whether retrying the same call later can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::TransportError(_))
    }
}

impl From<rusqlite::Error> for DomainError {
    fn from(error: rusqlite::Error) -> Self {
        DomainError::InternalError(format!("Database error: {}", error))
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(error: serde_json::Error) -> Self {
        DomainError::InternalError(format!("JSON error: {}", error))
    }
}

impl From<reqwest::Error> for DomainError {
    fn from(error: reqwest::Error) -> Self {
        DomainError::TransportError(format!("HTTP error: {}", error))
    }
}

impl From<std::io::Error> for DomainError {
    fn from(error: std::io::Error) -> Self {
        DomainError::InternalError(format!("IO error: {}", error))
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details = Vec::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                details.push(format!(
                    "{}: {}",
                    field,
                    error
                        .message
                        .as_ref()
                        .map_or("Invalid value".to_string(), |m| m.to_string())
                ));
            }
        }
        details.sort();
        DomainError::ValidationError(details.join("; "))
    }
}

impl From<String> for DomainError {
    fn from(error: String) -> Self {
        DomainError::InternalError(error)
    }
}

impl From<&str> for DomainError {
    fn from(error: &str) -> Self {
        DomainError::InternalError(error.to_string())
    }
}

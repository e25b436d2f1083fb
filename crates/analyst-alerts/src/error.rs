//! Error types for alerts, users and their storage

use analyst_chat::ChatError;
use analyst_utils::ConfigError;
use thiserror::Error;

/// Errors raised by the alert store, email composition and the scheduler
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Scheduler not found")]
    AlertNotFound(String),

    #[error("User not found")]
    UserNotFound(String),

    #[error("User with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] ChatError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AlertError {
    /// Whether the error means the requested record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AlertNotFound(_) | Self::UserNotFound(_))
    }
}

/// Result type for alert operations
pub type Result<T> = std::result::Result<T, AlertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_messages() {
        assert_eq!(
            AlertError::AlertNotFound("abc".to_string()).to_string(),
            "Scheduler not found"
        );
        assert_eq!(
            AlertError::UserNotFound("u1".to_string()).to_string(),
            "User not found"
        );
        assert!(AlertError::UserNotFound("u1".to_string()).is_not_found());
        assert!(!AlertError::InvalidInput("x".to_string()).is_not_found());
    }

    #[test]
    fn test_io_conversion() {
        let err: AlertError = std::io::Error::other("disk full").into();
        assert_eq!(err.to_string(), "Storage error: disk full");
    }
}

//! Domain errors - error types for the domain layer and its ports

use thiserror::Error;
use uuid::Uuid;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Status record not found: {0}")]
    RecordNotFound(Uuid),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Invalid subject id: {0:?}")]
    InvalidSubject(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::RecordNotFound(_) => "UNKNOWN_RECORD",
            Self::UnknownCollection(_) => "UNKNOWN_COLLECTION",
            Self::InvalidSubject(_) => "INVALID_SUBJECT",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::SubscriptionFailed(_) => "SUBSCRIPTION_FAILED",
            Self::SerializationError(_) => "SERIALIZATION_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound(_) | Self::UnknownCollection(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidSubject(_))
    }

    /// Check if this failure is worth retrying on the next cycle
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(_) | Self::CacheError(_) | Self::SubscriptionFailed(_)
        )
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::RecordNotFound(Uuid::nil()).code(), "UNKNOWN_RECORD");
        assert_eq!(
            DomainError::SubscriptionFailed("refused".to_string()).code(),
            "SUBSCRIPTION_FAILED"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(DomainError::RecordNotFound(Uuid::nil()).is_not_found());
        assert!(DomainError::InvalidSubject(String::new()).is_validation());
        assert!(DomainError::DatabaseError("timeout".to_string()).is_transient());
        assert!(!DomainError::UnknownCollection("users".to_string()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidSubject(" ".to_string());
        assert_eq!(err.to_string(), "Invalid subject id: \" \"");

        let err = DomainError::DatabaseError("connection reset".to_string());
        assert_eq!(err.to_string(), "Database error: connection reset");
    }
}

//! Error handling utilities for repositories

use presence_core::{DomainError, USERS_STATUS_COLLECTION};
use sqlx::Error as SqlxError;
use uuid::Uuid;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Reject any collection other than `users_status`
pub fn check_collection(collection: &str) -> Result<(), DomainError> {
    if collection == USERS_STATUS_COLLECTION {
        Ok(())
    } else {
        Err(DomainError::UnknownCollection(collection.to_string()))
    }
}

/// Create a "record not found" error
pub fn record_not_found(id: Uuid) -> DomainError {
    DomainError::RecordNotFound(id)
}

//! Store error types
//!
//! Defines all errors that can occur in the storage layer.

use thiserror::Error;

use crate::schedule::Conflict;

/// Errors that can occur in the clinic store
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A record broke one of the data model invariants
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested appointment does not exist
    #[error("Appointment not found: {0}")]
    AppointmentNotFound(u64),

    /// The booking collides with existing appointments
    #[error("Scheduling conflict with {} appointment(s)", .0.len())]
    Conflicts(Vec<Conflict>),

    /// Seed data could not be loaded
    #[error("Seed error: {0}")]
    Seed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::AppointmentNotFound(42);
        assert_eq!(err.to_string(), "Appointment not found: 42");

        let err = StorageError::Conflicts(vec![]);
        assert_eq!(err.to_string(), "Scheduling conflict with 0 appointment(s)");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let storage_err: StorageError = io_err.into();
        assert!(matches!(storage_err, StorageError::Io(_)));
    }
}

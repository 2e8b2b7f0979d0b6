//! Error types for Content Studio.

use std::time::Duration;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Lead error: {0}")]
    Lead(#[from] LeadError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Client-persisted (device-local) storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to read key {key}: {reason}")]
    ReadFailed { key: String, reason: String },

    #[error("Failed to write key {key}: {reason}")]
    WriteFailed { key: String, reason: String },
}

/// Identity provider errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Metadata read failed for user {user_id}: {reason}")]
    MetadataRead { user_id: String, reason: String },

    #[error("Metadata update failed for user {user_id}: {reason}")]
    MetadataUpdate { user_id: String, reason: String },
}

/// Lead-capture submission errors.
#[derive(Debug, thiserror::Error)]
pub enum LeadError {
    #[error("Lead endpoint request failed: {0}")]
    Request(String),

    #[error("Lead endpoint rejected submission with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Lead endpoint timed out after {0:?}")]
    Timeout(Duration),
}

/// Onboarding form validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Field {field} is required")]
    Required { field: &'static str },

    #[error("Field {field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ValidationError {
    /// Name of the form field that failed validation.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required { field } | Self::Invalid { field, .. } => field,
        }
    }
}

/// Content workflow errors.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Invalid input for {workflow}: {reason}")]
    InvalidInput { workflow: String, reason: String },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_reports_field() {
        let err = ValidationError::Required { field: "name" };
        assert_eq!(err.field(), "name");
        assert_eq!(err.to_string(), "Field name is required");

        let err = ValidationError::Invalid {
            field: "phone",
            reason: "needs at least 10 digits".into(),
        };
        assert_eq!(err.field(), "phone");
    }

    #[test]
    fn nested_errors_convert_into_top_level() {
        let err: Error = LeadError::Rejected {
            status: 500,
            body: "boom".into(),
        }
        .into();
        assert!(err.to_string().contains("status 500"));

        let err: Error = StorageError::ReadFailed {
            key: "freeUsesRemaining".into(),
            reason: "locked".into(),
        }
        .into();
        assert!(matches!(err, Error::Storage(StorageError::ReadFailed { .. })));
    }
}

//! Error types for Ride Admin.
//!
//! This module defines the `AdminError` enum which represents all possible
//! errors that can occur while loading, aggregating or editing dashboard data.

use thiserror::Error;

/// The main error type for Ride Admin operations.
///
/// Store, validation and authentication failures all flow through this
/// enum so the HTTP layer can map them to a status code and a static
/// user-facing message.
#[derive(Debug, Error)]
pub enum AdminError {
    // ==================== Authentication Errors ====================
    /// No authenticated admin session.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The identity token was rejected by the provider.
    #[error("Invalid token")]
    InvalidToken,

    // ==================== Validation Errors ====================
    /// A required field is missing.
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A field value is invalid.
    #[error("Invalid field value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// The requested change is not allowed from the record's current state.
    #[error("Invalid transition for {entity} '{id}': {reason}")]
    InvalidTransition {
        entity: String,
        id: String,
        reason: String,
    },

    // ==================== Storage Errors ====================
    /// A document store operation failed.
    #[error("Store error: {message}")]
    StoreError { message: String },

    /// An object storage operation failed.
    #[error("Object storage error: {message}")]
    StorageError { message: String },

    /// The requested record was not found.
    #[error("Record not found: {entity} with {key}={value}")]
    NotFound {
        entity: String,
        key: String,
        value: String,
    },

    // ==================== Internal Errors ====================
    /// Serialization/deserialization failed.
    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

impl AdminError {
    /// Creates a new store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreError {
            message: message.into(),
        }
    }

    /// Creates a new object storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    /// Creates a new not found error.
    pub fn not_found(entity: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a new missing field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates a new invalid field error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new invalid transition error.
    pub fn transition(entity: impl Into<String>, id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTransition {
            entity: entity.into(),
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is a user-facing error (vs internal).
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated
                | Self::InvalidToken
                | Self::MissingField { .. }
                | Self::InvalidField { .. }
                | Self::InvalidTransition { .. }
                | Self::NotFound { .. }
        )
    }

    /// Returns an HTTP status code appropriate for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated | Self::InvalidToken => 401,
            Self::NotFound { .. } => 404,
            Self::InvalidTransition { .. } => 409,
            Self::MissingField { .. } | Self::InvalidField { .. } => 422,
            Self::StoreError { .. } | Self::StorageError { .. } => 502,
            _ => 500,
        }
    }

    /// Returns the message shown to dashboard users.
    ///
    /// Backend failures are never echoed verbatim; validation errors are,
    /// since they describe what the user typed.
    pub fn user_message(&self) -> String {
        if self.is_user_error() {
            return self.to_string();
        }
        match self {
            Self::StoreError { .. } => "Failed to load dashboard data".to_string(),
            Self::StorageError { .. } => "Failed to upload media".to_string(),
            _ => "Something went wrong".to_string(),
        }
    }
}

/// A Result type alias using AdminError.
pub type AdminResult<T> = Result<T, AdminError>;

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AdminError::not_found("ride", "id", "r1");
        assert_eq!(err.to_string(), "Record not found: ride with id=r1");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AdminError::Unauthenticated.status_code(), 401);
        assert_eq!(AdminError::not_found("ride", "id", "x").status_code(), 404);
        assert_eq!(AdminError::missing("headline").status_code(), 422);
        assert_eq!(AdminError::store("boom").status_code(), 502);
    }

    #[test]
    fn test_user_message_hides_backend_details() {
        let err = AdminError::store("permission denied on projects/abc");
        assert_eq!(err.user_message(), "Failed to load dashboard data");

        let err = AdminError::missing("headline");
        assert_eq!(err.user_message(), "Missing required field: headline");
    }
}

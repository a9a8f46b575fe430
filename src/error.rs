//! Error types for the follow resolver.
//!
//! Errors are strongly typed using thiserror. Only construction-time failures
//! (invalid configuration, missing collaborators, unopenable storage) ever
//! reach a caller: lookup and storage failures during a resolution are caught
//! where they happen, logged, and turned into "no value".

use thiserror::Error;

pub use crate::storage::StorageError;

/// Validation errors for configuration and builder input.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Duration '{field}' must be greater than zero")]
    ZeroDuration {
        field: &'static str,
    },

    #[error("Field '{field}' cannot be empty")]
    EmptyField {
        field: &'static str,
    },

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: &'static str,
    },

    #[error("Lookup endpoint '{template}' has no {{id}} placeholder")]
    InvalidEndpointTemplate {
        template: String,
    },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        url: String,
        reason: String,
    },
}

/// Failures of the remote alias lookup service.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Lookup request failed: {message}")]
    Request {
        message: String,
    },

    #[error("Lookup service returned status {code}")]
    Status {
        code: u16,
    },

    #[error("Malformed lookup response: {message}")]
    Malformed {
        message: String,
    },

    #[error("Lookup service has no record for this identifier")]
    NotFound,
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            if status == reqwest::StatusCode::NOT_FOUND {
                return Self::NotFound;
            }
            Self::Status {
                code: status.as_u16(),
            }
        } else if err.is_decode() {
            Self::Malformed {
                message: err.to_string(),
            }
        } else {
            Self::Request {
                message: err.to_string(),
            }
        }
    }
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum FollowError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl FollowError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a lookup error.
    #[must_use]
    pub const fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if retrying the same call could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Internal { .. } => false,
            Self::Lookup(e) => match e {
                LookupError::Request { .. } => true,
                LookupError::Status { code } => *code >= 500 || *code == 429,
                LookupError::Malformed { .. } | LookupError::NotFound => false,
            },
            Self::Storage(e) => matches!(e, StorageError::Io(_)),
        }
    }
}

/// Result type alias for fallible resolver operations.
pub type FollowResult<T> = Result<T, FollowError>;

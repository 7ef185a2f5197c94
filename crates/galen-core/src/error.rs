//! Error types for Galen.
//!
//! This module provides the [`GalenError`] type, which is the standard error
//! type used throughout the bundle dispatcher.
//!
//! The variants follow the dispatcher's outcome taxonomy: validation
//! failures and declared operational failures are recovered per entry and
//! surfaced as structured outcomes; internal failures stay opaque; malformed
//! envelopes and integrity violations fail the whole request.

use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`GalenError`].
pub type GalenResult<T> = Result<T, GalenError>;

/// Standard error type for Galen.
///
/// `GalenError` provides structured errors with:
/// - Per-entry outcome classification (validation / declared / unexpected)
/// - HTTP status code mapping
/// - Opaque internal error chaining (never exposed to clients)
///
/// # Example
///
/// ```
/// use galen_core::GalenError;
/// use http::StatusCode;
///
/// fn check_body(body: &[u8]) -> Result<(), GalenError> {
///     if body.is_empty() {
///         return Err(GalenError::validation("Body cannot be empty"));
///     }
///     Ok(())
/// }
///
/// let err = GalenError::not_implemented("Not implemented");
/// assert_eq!(err.status_code(), StatusCode::NOT_IMPLEMENTED);
/// ```
#[derive(Error, Debug)]
pub enum GalenError {
    /// Sub-request content was malformed for the target operation.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
        /// One entry per individual violation.
        violations: Vec<String>,
    },

    /// A handler explicitly declared an HTTP-style failure.
    #[error("Operation error ({status}): {message}")]
    Operation {
        /// The declared status code.
        status: StatusCode,
        /// Diagnostic text surfaced in the entry outcome.
        message: String,
    },

    /// Unexpected internal failure. Details are never leaked to clients.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message (logs only).
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The inbound envelope itself could not be understood.
    ///
    /// Surfaced as a single whole-request failure, never per entry.
    #[error("Malformed bundle: {message}")]
    MalformedBundle {
        /// Human-readable error message.
        message: String,
    },

    /// A handler violated its contract (e.g. returned a non-document body).
    ///
    /// Fails the whole bundle rather than producing a row-level response.
    #[error("Integrity violation: {message}")]
    Integrity {
        /// Human-readable error message.
        message: String,
    },
}

impl GalenError {
    /// Creates a validation error with a message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// Creates a validation error carrying one record per violation.
    #[must_use]
    pub fn validation_with(message: impl Into<String>, violations: Vec<String>) -> Self {
        Self::Validation {
            message: message.into(),
            violations,
        }
    }

    /// Creates a declared operational error with an explicit status.
    #[must_use]
    pub fn operation(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Operation {
            status,
            message: message.into(),
        }
    }

    /// Creates a declared "not implemented" error (status 501).
    #[must_use]
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::operation(StatusCode::NOT_IMPLEMENTED, message)
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a malformed-bundle error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedBundle {
            message: message.into(),
        }
    }

    /// Creates an integrity-violation error.
    #[must_use]
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::MalformedBundle { .. } => StatusCode::BAD_REQUEST,
            Self::Operation { status, .. } => *status,
            Self::Internal { .. } | Self::Integrity { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` if this error fails the whole bundle rather than one entry.
    #[must_use]
    pub fn is_bundle_fatal(&self) -> bool {
        matches!(self, Self::MalformedBundle { .. } | Self::Integrity { .. })
    }
}

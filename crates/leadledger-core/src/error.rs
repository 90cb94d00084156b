//! Error types for the core library.

use thiserror::Error;

use crate::enquiry::EnquiryId;
use crate::intake::ValidationError;
use crate::service::SendError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Submission failed field validation.
    #[error("Validation failed: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    /// Required fields were missing from an admin action.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// Admin input could not be interpreted.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or incorrect credential for a protected operation.
    #[error("Unauthorized")]
    Unauthorized,

    /// Enquiry not found.
    #[error("Enquiry not found: {0}")]
    NotFound(EnquiryId),

    /// Mail sender reported a failure.
    #[error("Send failed: {0}")]
    Send(#[from] SendError),

    /// Record store operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be decoded.
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
}

impl Error {
    /// Whether this error means the record store could not be reached.
    ///
    /// Read-only callers may degrade on this; write paths must surface it.
    #[must_use]
    pub const fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field(), e.message()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

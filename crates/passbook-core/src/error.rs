//! Error types for the Passbook system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PassbookError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PassbookError {
    /// Whether this is a business-logic outcome rather than an
    /// infrastructure failure.
    ///
    /// Business outcomes are reported to clients verbatim inside a
    /// 200-status envelope; everything else becomes a generic 500 with
    /// details logged server-side only.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            PassbookError::InvalidInput { .. }
                | PassbookError::NotFound { .. }
                | PassbookError::Unauthorized { .. }
                | PassbookError::Conflict { .. }
        )
    }
}

pub type PassbookResult<T> = Result<T, PassbookError>;

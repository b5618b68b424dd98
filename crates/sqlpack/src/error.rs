//! Error types for sqlpack

use std::time::Duration;
use thiserror::Error;

/// Result type alias for packing operations
pub type PackResult<T> = Result<T, PackError>;

/// Result type alias for statement execution
pub type ExecResult<T> = Result<T, ExecError>;

/// Errors raised while turning rows into statements.
///
/// Every variant is a hard stop for the batch: no partial statement list is
/// ever returned alongside one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    /// No rows to pack, either from the start or after skipping empty rows.
    #[error("no rows to pack")]
    EmptyInput,

    /// The byte limit lies outside the accepted `max_allowed_packet` range.
    #[error("invalid byte limit {limit}: must be between {min} and {max}")]
    InvalidByteLimit { limit: usize, min: usize, max: usize },

    /// A row without fields was found while the empty-row policy is `Fail`.
    #[error("row {index} has no fields; a tuple cannot be built from it")]
    EmptyRow { index: usize },

    /// A single row does not fit under the limit even in a statement of its own.
    #[error("row {index} renders to a {len}-byte statement, over the {limit}-byte limit")]
    OversizedSingleRow {
        index: usize,
        len: usize,
        limit: usize,
    },

    /// A table name that cannot be quoted as an identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl PackError {
    /// Create an invalid identifier error
    pub fn invalid_identifier(message: impl Into<String>) -> Self {
        Self::InvalidIdentifier(message.into())
    }

    /// Check if this is an empty input error
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }

    /// Check if this is an invalid byte limit error
    pub fn is_invalid_byte_limit(&self) -> bool {
        matches!(self, Self::InvalidByteLimit { .. })
    }

    /// Check if this is an empty row error
    pub fn is_empty_row(&self) -> bool {
        matches!(self, Self::EmptyRow { .. })
    }

    /// Check if this is an oversized row error
    pub fn is_oversized_row(&self) -> bool {
        matches!(self, Self::OversizedSingleRow { .. })
    }
}

/// Errors reported by a [`StatementExecutor`](crate::exec::StatementExecutor)
/// or by the worker pool around it.
#[derive(Debug, Clone, Error)]
pub enum ExecError {
    /// The executor ran the statement and the server rejected it.
    #[error("Execution error: {0}")]
    Execution(String),

    /// The statement did not complete within the configured timeout.
    #[error("Statement timeout after {0:?}")]
    Timeout(Duration),

    /// The worker task died before reporting a result.
    #[error("Worker error: {0}")]
    Worker(String),
}

impl ExecError {
    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

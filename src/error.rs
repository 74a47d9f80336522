//! Error types for board storage and sync.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::BoardId;

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// Errors surfaced by the reader, the reconciler and the user store.
#[derive(Error, Debug)]
pub enum BoardError {
    /// Entity absent, or present but not owned by the caller.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A sync named a board that belongs to another user.
    #[error("not authorized: board {0} belongs to another user")]
    Unauthorized(BoardId),

    /// Malformed or inconsistent input.
    #[error("invalid payload: {0}")]
    Validation(String),

    /// The database file was written by a newer schema.
    #[error("unsupported schema version {found}, this build supports up to {supported}")]
    IncompatibleSchema { found: i64, supported: i64 },

    /// Underlying SQLite failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Coarse error classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    Validation,
    StorageFailure,
}

impl BoardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BoardError::NotFound(_) => ErrorKind::NotFound,
            BoardError::Unauthorized(_) => ErrorKind::Unauthorized,
            BoardError::Validation(_) => ErrorKind::Validation,
            BoardError::IncompatibleSchema { .. } | BoardError::Storage(_) => {
                ErrorKind::StorageFailure
            }
        }
    }

    /// Returns true if the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }

    /// Returns true if this is a storage-side failure.
    pub fn is_server_error(&self) -> bool {
        self.kind() == ErrorKind::StorageFailure
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        BoardError::Validation(message.into())
    }
}

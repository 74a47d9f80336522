//! Request-level entry points: parse the request body, run the operation for
//! the authenticated user and hand back something serializable.

pub mod boards;
pub mod users;

use serde::Serialize;
use tracing::error;

use crate::config::Config;
use crate::db::Store;
use crate::error::{BoardError, ErrorKind};
use crate::reader::BoardReader;
use crate::sync::BoardReconciler;
use crate::users::UserRepository;

/// Everything a command needs, built once per process around one store.
#[derive(Clone)]
pub struct AppContext {
    pub reader: BoardReader,
    pub reconciler: BoardReconciler,
    pub users: UserRepository,
}

impl AppContext {
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            reader: BoardReader::new(store.clone()),
            reconciler: BoardReconciler::new(store.clone()).with_max_boards(config.max_sync_boards),
            users: UserRepository::new(store),
        }
    }
}

/// Failure as reported to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CommandError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }

    /// HTTP status an API front end should answer with.
    pub fn status(&self) -> u16 {
        match self.kind {
            ErrorKind::NotFound => 404,
            ErrorKind::Unauthorized => 403,
            ErrorKind::Validation => 400,
            ErrorKind::StorageFailure => 500,
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CommandError {}

impl From<BoardError> for CommandError {
    fn from(err: BoardError) -> Self {
        if err.is_server_error() {
            error!(error = %err, "command failed");
        }
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

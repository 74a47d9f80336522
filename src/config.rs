//! Runtime configuration.

use std::env;
use std::path::PathBuf;

/// Upper bound on boards accepted in one sync payload.
pub const DEFAULT_MAX_SYNC_BOARDS: usize = 100;

const DEFAULT_DATABASE_PATH: &str = "kanban.db";

/// Configuration for opening the store and running syncs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Maximum boards per sync payload.
    pub max_sync_boards: usize,
}

impl Config {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            max_sync_boards: DEFAULT_MAX_SYNC_BOARDS,
        }
    }

    /// Reads `DATABASE_PATH` and `KANBAN_MAX_SYNC_BOARDS`, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_path = lookup("DATABASE_PATH")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());
        let mut config = Self::new(database_path);

        match lookup("KANBAN_MAX_SYNC_BOARDS").map(|value| value.trim().parse::<usize>()) {
            Some(Ok(max)) if max > 0 => config.max_sync_boards = max,
            Some(_) => tracing::warn!("ignoring invalid KANBAN_MAX_SYNC_BOARDS"),
            None => {}
        }

        config
    }

    /// Sets the database file.
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Sets the maximum boards per sync payload.
    pub fn with_max_sync_boards(mut self, max: usize) -> Self {
        self.max_sync_boards = max;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_PATH)
    }
}

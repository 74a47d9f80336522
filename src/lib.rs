//! Board storage and sync backend for Personal Kanban.
//!
//! Clients own boards made of columns, labels, tasks and settings, and push
//! complete snapshots of them. [`BoardReconciler`] replaces the stored state
//! of every pushed board in one transaction after checking ownership;
//! [`BoardReader`] assembles full boards back for their owner.

pub mod commands;
pub mod config;
mod db;
pub mod error;
pub mod migrations;
pub mod models;
pub mod reader;
pub mod sync;
pub mod users;
mod validation;

#[cfg(test)]
mod test_support;

pub use commands::{AppContext, CommandError};
pub use config::Config;
pub use db::Store;
pub use error::{BoardError, BoardResult, ErrorKind};
pub use models::{
    BoardAggregate, BoardId, BoardSnapshot, BoardSummary, Column, ColumnHistory, Label, Priority,
    Settings, SyncPayload, Task, TaskId, User, UserId,
};
pub use reader::BoardReader;
pub use sync::BoardReconciler;
pub use users::UserRepository;

/// Opens the configured database and wires every component to it.
pub fn open(config: &Config) -> BoardResult<AppContext> {
    let store = Store::open(&config.database_path)?;
    tracing::info!(path = %config.database_path.display(), "database opened");
    Ok(AppContext::new(store, config))
}

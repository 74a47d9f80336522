use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;

use crate::error::{BoardError, BoardResult};
use crate::models::{BoardId, TaskId, UserId};

pub(crate) const SCHEMA_VERSION: i64 = 1;

/// Shared handle to the board database.
///
/// Cloning is cheap; every clone talks to the same connection. SQLite
/// serializes writers anyway, so one connection behind a mutex is the pool.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> BoardResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    /// Private in-memory database, used by tests and dry runs.
    pub fn open_in_memory() -> BoardResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> BoardResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        init_db(&conn)?;
        Ok(Store {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with exclusive use of the connection.
    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> BoardResult<T>,
    ) -> BoardResult<T> {
        let mut conn = self.conn.lock();
        f(&mut conn)
    }
}

fn init_db(conn: &Connection) -> BoardResult<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version > SCHEMA_VERSION {
        return Err(BoardError::IncompatibleSchema {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            provider TEXT,
            provider_id TEXT,
            password_hash TEXT,
            is_verified INTEGER NOT NULL DEFAULT 0,
            verification_token TEXT,
            verification_token_expires_at INTEGER,
            created_at INTEGER NOT NULL,
            UNIQUE(provider, provider_id)
        );
        CREATE UNIQUE INDEX IF NOT EXISTS users_credential_email
            ON users(email) WHERE password_hash IS NOT NULL;
        CREATE TABLE IF NOT EXISTS boards (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS boards_user_id ON boards(user_id);
        CREATE TABLE IF NOT EXISTS columns (
            board_id TEXT NOT NULL,
            id TEXT NOT NULL,
            name TEXT NOT NULL,
            color TEXT NOT NULL,
            collapsed INTEGER NOT NULL,
            \"order\" INTEGER NOT NULL,
            PRIMARY KEY(board_id, id),
            FOREIGN KEY(board_id) REFERENCES boards(id) ON DELETE CASCADE
        );
        CREATE TABLE IF NOT EXISTS labels (
            board_id TEXT NOT NULL,
            id TEXT NOT NULL,
            name TEXT NOT NULL,
            color TEXT NOT NULL,
            \"group\" TEXT NOT NULL,
            PRIMARY KEY(board_id, id),
            FOREIGN KEY(board_id) REFERENCES boards(id) ON DELETE CASCADE
        );
        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            board_id TEXT NOT NULL,
            column_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            priority TEXT NOT NULL,
            due_date TEXT NOT NULL,
            \"order\" INTEGER NOT NULL,
            creation_date INTEGER NOT NULL,
            change_date INTEGER NOT NULL,
            done_date INTEGER,
            FOREIGN KEY(board_id) REFERENCES boards(id) ON DELETE CASCADE,
            FOREIGN KEY(board_id, column_id) REFERENCES columns(board_id, id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS tasks_board_column ON tasks(board_id, column_id);
        CREATE TABLE IF NOT EXISTS task_labels (
            task_id TEXT NOT NULL,
            board_id TEXT NOT NULL,
            label_id TEXT NOT NULL,
            PRIMARY KEY(task_id, label_id),
            FOREIGN KEY(task_id) REFERENCES tasks(id) ON DELETE CASCADE,
            FOREIGN KEY(board_id, label_id) REFERENCES labels(board_id, id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS task_labels_board_label ON task_labels(board_id, label_id);
        CREATE TABLE IF NOT EXISTS column_history (
            task_id TEXT NOT NULL,
            board_id TEXT NOT NULL,
            column_id TEXT NOT NULL,
            at INTEGER NOT NULL,
            FOREIGN KEY(task_id) REFERENCES tasks(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS column_history_task ON column_history(task_id);
        CREATE INDEX IF NOT EXISTS column_history_board ON column_history(board_id, at);
        CREATE TABLE IF NOT EXISTS settings (
            board_id TEXT PRIMARY KEY,
            show_priority INTEGER NOT NULL,
            show_due_date INTEGER NOT NULL,
            show_age INTEGER NOT NULL,
            show_change_date INTEGER NOT NULL,
            locale TEXT NOT NULL,
            default_priority TEXT NOT NULL,
            notification_days INTEGER NOT NULL,
            FOREIGN KEY(board_id) REFERENCES boards(id) ON DELETE CASCADE
        );",
    )?;

    if version == 0 {
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))?;
    }
    Ok(())
}

/// Current owner of a board, if the board exists at all.
pub(crate) fn board_owner(conn: &Connection, board_id: BoardId) -> BoardResult<Option<UserId>> {
    let owner = conn
        .query_row(
            "SELECT user_id FROM boards WHERE id = ?1",
            params![board_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(owner)
}

#[derive(Debug, thiserror::Error)]
#[error("invalid timestamp {0} in database")]
struct InvalidTimestamp(i64);

pub(crate) fn datetime_from_millis(value: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(value).single()
}

/// Reads an epoch-millisecond column as a UTC timestamp.
pub(crate) fn millis_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let value: i64 = row.get(idx)?;
    datetime_from_millis(value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            Box::new(InvalidTimestamp(value)),
        )
    })
}

pub(crate) fn optional_millis_column(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let value: Option<i64> = row.get(idx)?;
    match value {
        Some(value) => datetime_from_millis(value).map(Some).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Integer,
                Box::new(InvalidTimestamp(value)),
            )
        }),
        None => Ok(None),
    }
}

macro_rules! uuid_sql {
    ($($name:ident),*) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.0.to_string()))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse::<$name>()
                        .map_err(|e| FromSqlError::Other(Box::new(e)))
                }
            }
        )*
    };
}

uuid_sql!(UserId, BoardId, TaskId);

//! Write side: full-replace board sync and owner-scoped deletion.
//!
//! A sync applies every board of the payload inside one immediate
//! transaction. Each board is ownership-checked, its header upserted and all
//! nested rows deleted and re-inserted from the snapshot. The first failing
//! board aborts the whole payload; dropping the transaction rolls it back.

use rusqlite::{params, Transaction, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::config::DEFAULT_MAX_SYNC_BOARDS;
use crate::db::{board_owner, Store};
use crate::error::{BoardError, BoardResult};
use crate::models::{BoardId, BoardSnapshot, SyncPayload, UserId};
use crate::validation::validate_payload;

/// Applies client snapshots to the store.
#[derive(Clone)]
pub struct BoardReconciler {
    store: Store,
    max_boards: usize,
}

impl BoardReconciler {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            max_boards: DEFAULT_MAX_SYNC_BOARDS,
        }
    }

    /// Sets the maximum boards accepted per payload.
    pub fn with_max_boards(mut self, max: usize) -> Self {
        self.max_boards = max;
        self
    }

    /// Replaces the stored state of every board in `payload` with the
    /// snapshot, or changes nothing at all.
    pub fn sync_boards(&self, user: UserId, payload: &SyncPayload) -> BoardResult<()> {
        validate_payload(payload, self.max_boards)?;

        self.store.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            for board in &payload.boards {
                apply_snapshot(&tx, user, board)?;
            }
            tx.commit()?;
            Ok(())
        })?;

        info!(user = %user, boards = payload.boards.len(), "sync committed");
        Ok(())
    }

    /// Deletes a board and everything under it. A board that is missing or
    /// owned by someone else reports `NotFound`.
    pub fn delete_board(&self, user: UserId, board_id: BoardId) -> BoardResult<()> {
        let deleted = self.store.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM boards WHERE id = ?1 AND user_id = ?2",
                params![board_id, user],
            )?)
        })?;
        if deleted == 0 {
            debug!(user = %user, board = %board_id, "delete matched no board");
            return Err(BoardError::NotFound("board"));
        }
        info!(user = %user, board = %board_id, "board deleted");
        Ok(())
    }
}

fn apply_snapshot(tx: &Transaction<'_>, user: UserId, board: &BoardSnapshot) -> BoardResult<()> {
    match board_owner(tx, board.id)? {
        Some(owner) if owner != user => {
            warn!(user = %user, board = %board.id, "sync names a board owned by another user");
            return Err(BoardError::Unauthorized(board.id));
        }
        Some(_) => debug!(board = %board.id, "replacing board"),
        None => debug!(board = %board.id, "creating board"),
    }

    // Owner and creation time are fixed by the first insert.
    tx.execute(
        "INSERT INTO boards (id, user_id, name, created_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        params![board.id, user, board.name, board.created_at.timestamp_millis()],
    )?;

    clear_board_contents(tx, board.id)?;
    insert_board_contents(tx, board)
}

/// Removes nested rows. Task links and history go with their tasks.
fn clear_board_contents(tx: &Transaction<'_>, board_id: BoardId) -> BoardResult<()> {
    tx.execute("DELETE FROM tasks WHERE board_id = ?1", params![board_id])?;
    tx.execute("DELETE FROM columns WHERE board_id = ?1", params![board_id])?;
    tx.execute("DELETE FROM labels WHERE board_id = ?1", params![board_id])?;
    tx.execute("DELETE FROM settings WHERE board_id = ?1", params![board_id])?;
    Ok(())
}

fn insert_board_contents(tx: &Transaction<'_>, board: &BoardSnapshot) -> BoardResult<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO columns (board_id, id, name, color, collapsed, \"order\")
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for column in &board.columns {
        stmt.execute(params![
            board.id,
            column.id,
            column.name,
            column.color,
            column.collapsed,
            column.order
        ])?;
    }

    let mut stmt = tx.prepare_cached(
        "INSERT INTO labels (board_id, id, name, color, \"group\") VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for label in &board.labels {
        stmt.execute(params![board.id, label.id, label.name, label.color, label.group])?;
    }

    let mut task_stmt = tx.prepare_cached(
        "INSERT INTO tasks (id, board_id, column_id, title, description, priority, due_date,
                            \"order\", creation_date, change_date, done_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )?;
    let mut link_stmt = tx.prepare_cached(
        "INSERT INTO task_labels (task_id, board_id, label_id) VALUES (?1, ?2, ?3)",
    )?;
    let mut history_stmt = tx.prepare_cached(
        "INSERT INTO column_history (task_id, board_id, column_id, at) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for task in &board.tasks {
        task_stmt.execute(params![
            task.id,
            board.id,
            task.column_id,
            task.title,
            task.description,
            task.priority.as_str(),
            task.due_date,
            task.order,
            task.creation_date.timestamp_millis(),
            task.change_date.timestamp_millis(),
            task.done_date.map(|at| at.timestamp_millis()),
        ])?;
        for label_id in &task.labels {
            link_stmt.execute(params![task.id, board.id, label_id])?;
        }
        for entry in &task.history {
            history_stmt.execute(params![
                task.id,
                board.id,
                entry.column_id,
                entry.at.timestamp_millis()
            ])?;
        }
    }

    if let Some(settings) = &board.settings {
        tx.execute(
            "INSERT INTO settings (board_id, show_priority, show_due_date, show_age,
                                   show_change_date, locale, default_priority, notification_days)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                board.id,
                settings.show_priority,
                settings.show_due_date,
                settings.show_age,
                settings.show_change_date,
                settings.locale,
                settings.default_priority.as_str(),
                settings.notification_days
            ],
        )?;
    }

    Ok(())
}

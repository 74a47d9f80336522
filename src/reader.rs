//! Read side: board listings and full board assembly.

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

use crate::db::{millis_column, optional_millis_column, Store};
use crate::error::{BoardError, BoardResult};
use crate::models::{
    BoardAggregate, BoardId, BoardSummary, Column, ColumnHistory, Label, Priority, Settings, Task,
    TaskId, UserId,
};

/// Loads boards for their owner. Never writes.
#[derive(Clone)]
pub struct BoardReader {
    store: Store,
}

impl BoardReader {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Board headers owned by `user`, in storage order.
    pub fn list_boards(&self, user: UserId) -> BoardResult<Vec<BoardSummary>> {
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, name, created_at FROM boards
                 WHERE user_id = ?1 ORDER BY rowid",
            )?;
            let boards = stmt
                .query_map(params![user], summary_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(boards)
        })
    }

    /// Full board with columns, labels, tasks and settings.
    ///
    /// A board owned by someone else is reported exactly like a missing one.
    pub fn get_full_board(&self, user: UserId, board_id: BoardId) -> BoardResult<BoardAggregate> {
        self.store.with_conn(|conn| {
            let tx = conn.transaction()?;
            let board = load_board(&tx, user, board_id)?;
            tx.commit()?;
            Ok(board)
        })
    }
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<BoardSummary> {
    Ok(BoardSummary {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        created_at: millis_column(row, 3)?,
    })
}

fn load_board(conn: &Connection, user: UserId, board_id: BoardId) -> BoardResult<BoardAggregate> {
    let summary = conn
        .query_row(
            "SELECT id, user_id, name, created_at FROM boards WHERE id = ?1 AND user_id = ?2",
            params![board_id, user],
            summary_from_row,
        )
        .optional()?
        .ok_or(BoardError::NotFound("board"))?;

    let columns = load_columns(conn, board_id)?;
    let labels = load_labels(conn, board_id)?;
    let mut tasks = load_tasks(conn, board_id)?;
    if !tasks.is_empty() {
        attach_task_children(conn, board_id, &mut tasks)?;
    }
    let settings = load_settings(conn, board_id)?;

    Ok(BoardAggregate {
        id: summary.id,
        user_id: summary.user_id,
        name: summary.name,
        created_at: summary.created_at,
        columns,
        labels,
        tasks,
        settings,
    })
}

fn load_columns(conn: &Connection, board_id: BoardId) -> BoardResult<Vec<Column>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, color, collapsed, \"order\" FROM columns
         WHERE board_id = ?1 ORDER BY \"order\", rowid",
    )?;
    let columns = stmt
        .query_map(params![board_id], |row| {
            Ok(Column {
                id: row.get(0)?,
                name: row.get(1)?,
                color: row.get(2)?,
                collapsed: row.get(3)?,
                order: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn load_labels(conn: &Connection, board_id: BoardId) -> BoardResult<Vec<Label>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, color, \"group\" FROM labels WHERE board_id = ?1 ORDER BY rowid",
    )?;
    let labels = stmt
        .query_map(params![board_id], |row| {
            Ok(Label {
                id: row.get(0)?,
                name: row.get(1)?,
                color: row.get(2)?,
                group: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(labels)
}

fn load_tasks(conn: &Connection, board_id: BoardId) -> BoardResult<Vec<Task>> {
    let mut stmt = conn.prepare(
        "SELECT id, column_id, title, description, priority, due_date, \"order\",
                creation_date, change_date, done_date
         FROM tasks WHERE board_id = ?1 ORDER BY \"order\", rowid",
    )?;
    let tasks = stmt
        .query_map(params![board_id], |row| {
            let priority: String = row.get(4)?;
            Ok(Task {
                id: row.get(0)?,
                column_id: row.get(1)?,
                title: row.get(2)?,
                description: row.get(3)?,
                priority: Priority::parse(&priority),
                due_date: row.get(5)?,
                order: row.get(6)?,
                creation_date: millis_column(row, 7)?,
                change_date: millis_column(row, 8)?,
                done_date: optional_millis_column(row, 9)?,
                labels: Vec::new(),
                history: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

/// Fills label links and column history for every task of the board with
/// one query each, fanning rows out by task id.
fn attach_task_children(
    conn: &Connection,
    board_id: BoardId,
    tasks: &mut [Task],
) -> BoardResult<()> {
    let positions: HashMap<TaskId, usize> = tasks
        .iter()
        .enumerate()
        .map(|(idx, task)| (task.id, idx))
        .collect();

    let mut stmt = conn.prepare(
        "SELECT task_id, label_id FROM task_labels WHERE board_id = ?1 ORDER BY rowid",
    )?;
    let mut rows = stmt.query(params![board_id])?;
    while let Some(row) = rows.next()? {
        let task_id: TaskId = row.get(0)?;
        if let Some(&idx) = positions.get(&task_id) {
            tasks[idx].labels.push(row.get(1)?);
        }
    }

    let mut stmt = conn.prepare(
        "SELECT task_id, column_id, at FROM column_history
         WHERE board_id = ?1 ORDER BY at, rowid",
    )?;
    let mut rows = stmt.query(params![board_id])?;
    while let Some(row) = rows.next()? {
        let task_id: TaskId = row.get(0)?;
        if let Some(&idx) = positions.get(&task_id) {
            tasks[idx].history.push(ColumnHistory {
                column_id: row.get(1)?,
                at: millis_column(row, 2)?,
            });
        }
    }

    Ok(())
}

fn load_settings(conn: &Connection, board_id: BoardId) -> BoardResult<Option<Settings>> {
    let settings = conn
        .query_row(
            "SELECT show_priority, show_due_date, show_age, show_change_date, locale,
                    default_priority, notification_days
             FROM settings WHERE board_id = ?1",
            params![board_id],
            |row| {
                let default_priority: String = row.get(5)?;
                Ok(Settings {
                    show_priority: row.get(0)?,
                    show_due_date: row.get(1)?,
                    show_age: row.get(2)?,
                    show_change_date: row.get(3)?,
                    locale: row.get(4)?,
                    default_priority: Priority::parse(&default_priority),
                    notification_days: row.get(6)?,
                })
            },
        )
        .optional()?;
    Ok(settings)
}

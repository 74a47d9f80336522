//! Structural checks on a sync payload, run before any write.

use std::collections::HashSet;

use crate::error::{BoardError, BoardResult};
use crate::models::{BoardSnapshot, SyncPayload};

pub(crate) fn validate_payload(payload: &SyncPayload, max_boards: usize) -> BoardResult<()> {
    if payload.boards.len() > max_boards {
        return Err(BoardError::validation(format!(
            "too many boards: {} > {}",
            payload.boards.len(),
            max_boards
        )));
    }

    let mut board_ids = HashSet::new();
    let mut task_ids = HashSet::new();
    for board in &payload.boards {
        if !board_ids.insert(board.id) {
            return Err(BoardError::validation(format!(
                "board {} appears more than once",
                board.id
            )));
        }
        validate_snapshot(board)?;
        // Task ids are global, so a repeat across boards would collide too.
        for task in &board.tasks {
            if !task_ids.insert(task.id) {
                return Err(BoardError::validation(format!(
                    "task {} appears more than once",
                    task.id
                )));
            }
        }
    }
    Ok(())
}

fn validate_snapshot(board: &BoardSnapshot) -> BoardResult<()> {
    let mut column_ids = HashSet::new();
    for column in &board.columns {
        if column.id.trim().is_empty() {
            return Err(BoardError::validation(format!(
                "board {}: column without id",
                board.id
            )));
        }
        if column.name.trim().is_empty() {
            return Err(BoardError::validation(format!(
                "board {}: column {} has no name",
                board.id, column.id
            )));
        }
        if !column_ids.insert(column.id.as_str()) {
            return Err(BoardError::validation(format!(
                "board {}: duplicate column {}",
                board.id, column.id
            )));
        }
    }

    let mut label_ids = HashSet::new();
    for label in &board.labels {
        if label.id.trim().is_empty() {
            return Err(BoardError::validation(format!(
                "board {}: label without id",
                board.id
            )));
        }
        if !label_ids.insert(label.id.as_str()) {
            return Err(BoardError::validation(format!(
                "board {}: duplicate label {}",
                board.id, label.id
            )));
        }
    }

    for task in &board.tasks {
        if task.title.trim().is_empty() {
            return Err(BoardError::validation(format!(
                "board {}: task {} has no title",
                board.id, task.id
            )));
        }
        if !column_ids.contains(task.column_id.as_str()) {
            return Err(BoardError::validation(format!(
                "board {}: task {} references unknown column {}",
                board.id, task.id, task.column_id
            )));
        }
        let mut seen = HashSet::new();
        for label in &task.labels {
            if !label_ids.contains(label.as_str()) {
                return Err(BoardError::validation(format!(
                    "board {}: task {} references unknown label {}",
                    board.id, task.id, label
                )));
            }
            if !seen.insert(label.as_str()) {
                return Err(BoardError::validation(format!(
                    "board {}: task {} lists label {} twice",
                    board.id, task.id, label
                )));
            }
        }
    }

    if let Some(settings) = &board.settings {
        if settings.notification_days < 0 {
            return Err(BoardError::validation(format!(
                "board {}: notification days must not be negative",
                board.id
            )));
        }
    }

    Ok(())
}

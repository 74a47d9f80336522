use serde::{Deserialize, Serialize};

use crate::commands::{AppContext, CommandError};
use crate::models::{BoardAggregate, BoardId, BoardSummary, SyncPayload, UserId};

/// Body returned by a successful sync.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncResponse {
    pub status: String,
}

fn parse_board_id(board_id: &str) -> Result<BoardId, CommandError> {
    board_id
        .parse()
        .map_err(|_| CommandError::invalid("Invalid board ID"))
}

pub fn get_boards(ctx: &AppContext, user: UserId) -> Result<Vec<BoardSummary>, CommandError> {
    Ok(ctx.reader.list_boards(user)?)
}

pub fn get_full_board(
    ctx: &AppContext,
    user: UserId,
    board_id: &str,
) -> Result<BoardAggregate, CommandError> {
    let board_id = parse_board_id(board_id)?;
    Ok(ctx.reader.get_full_board(user, board_id)?)
}

pub fn sync(ctx: &AppContext, user: UserId, body: &str) -> Result<SyncResponse, CommandError> {
    let payload: SyncPayload = serde_json::from_str(body)
        .map_err(|e| CommandError::invalid(format!("Invalid request body: {e}")))?;
    ctx.reconciler.sync_boards(user, &payload)?;
    Ok(SyncResponse {
        status: "success".to_string(),
    })
}

pub fn delete_board(ctx: &AppContext, user: UserId, board_id: &str) -> Result<(), CommandError> {
    let board_id = parse_board_id(board_id)?;
    ctx.reconciler.delete_board(user, board_id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::Store;
    use crate::error::ErrorKind;
    use crate::test_support::{sample_board, seed_user};

    fn context() -> (Store, AppContext) {
        let store = Store::open_in_memory().unwrap();
        let ctx = AppContext::new(store.clone(), &Config::default());
        (store, ctx)
    }

    #[test]
    fn sync_body_round_trips_through_json() {
        let (store, ctx) = context();
        let user = seed_user(&store, "a@example.com");
        let board = sample_board("Json");
        let body = serde_json::to_string(&SyncPayload {
            boards: vec![board.clone()],
        })
        .unwrap();

        let response = sync(&ctx, user, &body).unwrap();
        assert_eq!(response.status, "success");

        let listed = get_boards(&ctx, user).unwrap();
        assert_eq!(listed.len(), 1);
        let loaded = get_full_board(&ctx, user, &board.id.to_string()).unwrap();
        assert_eq!(loaded.into_snapshot(), board);
    }

    #[test]
    fn malformed_input_is_a_validation_error() {
        let (store, ctx) = context();
        let user = seed_user(&store, "a@example.com");

        let err = sync(&ctx, user, "{\"boards\": 3}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = get_full_board(&ctx, user, "not-a-uuid").unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn foreign_board_access() {
        let (store, ctx) = context();
        let owner = seed_user(&store, "owner@example.com");
        let other = seed_user(&store, "other@example.com");
        let board = sample_board("Owned");
        let body = serde_json::to_string(&SyncPayload {
            boards: vec![board.clone()],
        })
        .unwrap();
        sync(&ctx, owner, &body).unwrap();

        let id = board.id.to_string();
        assert_eq!(get_full_board(&ctx, other, &id).unwrap_err().kind, ErrorKind::NotFound);
        assert_eq!(delete_board(&ctx, other, &id).unwrap_err().kind, ErrorKind::NotFound);
        assert_eq!(sync(&ctx, other, &body).unwrap_err().kind, ErrorKind::Unauthorized);

        delete_board(&ctx, owner, &id).unwrap();
        assert!(get_boards(&ctx, owner).unwrap().is_empty());
    }

    #[test]
    fn null_fields_sync_as_defaults() {
        let (store, ctx) = context();
        let user = seed_user(&store, "a@example.com");
        let board_id = BoardId::generate();
        let body = serde_json::json!({
            "boards": [{
                "id": board_id.to_string(),
                "name": "Nulls",
                "created_at": "2025-01-01T00:00:00Z",
                "columns": [{ "id": "todo", "name": "To Do", "color": null, "order": null }],
                "labels": null,
                "tasks": [{
                    "id": "6f1f3c1e-8a4e-4c0e-9a57-0d3f2b1c9e11",
                    "column_id": "todo",
                    "title": "Bare",
                    "description": null,
                    "priority": null,
                    "due_date": null,
                    "creation_date": "2025-01-01T00:00:00Z",
                    "change_date": "2025-01-01T00:00:00Z",
                    "labels": null,
                    "columnHistory": null
                }],
                "settings": { "defaultPriority": null }
            }]
        });

        sync(&ctx, user, &body.to_string()).unwrap();
        let loaded = get_full_board(&ctx, user, &board_id.to_string()).unwrap();
        assert!(loaded.labels.is_empty());
        let task = &loaded.tasks[0];
        assert_eq!(task.priority, crate::models::Priority::None);
        assert!(task.labels.is_empty());
        assert!(task.history.is_empty());
        assert!(task.description.is_empty());
        assert_eq!(loaded.settings.unwrap().locale, "en-US");
    }
}

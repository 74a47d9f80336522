//! Fixtures shared by unit tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::db::Store;
use crate::models::{
    BoardId, BoardSnapshot, Column, ColumnHistory, Label, Priority, Settings, Task, TaskId, UserId,
};
use crate::users::UserRepository;

pub(crate) fn ts(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_735_689_600_000 + millis).unwrap()
}

pub(crate) fn seed_user(store: &Store, email: &str) -> UserId {
    UserRepository::new(store.clone())
        .get_or_create_user(email, email, "test", email)
        .unwrap()
        .id
}

/// Board with two columns, two labels, two tasks and settings, all with
/// millisecond timestamps so a read returns it unchanged.
pub(crate) fn sample_board(name: &str) -> BoardSnapshot {
    BoardSnapshot {
        id: BoardId::generate(),
        name: name.to_string(),
        created_at: ts(0),
        columns: vec![
            Column {
                id: "todo".into(),
                name: "To Do".into(),
                color: "#3b82f6".into(),
                collapsed: false,
                order: 0,
            },
            Column {
                id: "done".into(),
                name: "Done".into(),
                color: "#22c55e".into(),
                collapsed: true,
                order: 1,
            },
        ],
        labels: vec![
            Label {
                id: "bug".into(),
                name: "Bug".into(),
                color: "#ef4444".into(),
                group: "type".into(),
            },
            Label {
                id: "feature".into(),
                name: "Feature".into(),
                color: "#3b82f6".into(),
                group: "type".into(),
            },
        ],
        tasks: vec![
            Task {
                id: TaskId::generate(),
                column_id: "todo".into(),
                title: "Fix login".into(),
                description: "Session expires too early".into(),
                priority: Priority::High,
                due_date: "2025-02-01".into(),
                order: 0,
                creation_date: ts(1_000),
                change_date: ts(2_000),
                done_date: None,
                labels: vec!["bug".into(), "feature".into()],
                history: vec![ColumnHistory {
                    column_id: "todo".into(),
                    at: ts(1_000),
                }],
            },
            Task {
                id: TaskId::generate(),
                column_id: "done".into(),
                title: "Ship export".into(),
                description: String::new(),
                priority: Priority::None,
                due_date: String::new(),
                order: 1,
                creation_date: ts(1_500),
                change_date: ts(4_000),
                done_date: Some(ts(4_000)),
                labels: vec!["feature".into()],
                history: vec![
                    ColumnHistory {
                        column_id: "todo".into(),
                        at: ts(1_500),
                    },
                    ColumnHistory {
                        column_id: "done".into(),
                        at: ts(4_000),
                    },
                ],
            },
        ],
        settings: Some(Settings::default()),
    }
}

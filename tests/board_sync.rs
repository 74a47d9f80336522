//! End-to-end behavior of sync, read and delete against a file-backed store.

use chrono::{DateTime, TimeZone, Utc};
use kanbansync_lib::{
    BoardError, BoardId, BoardReader, BoardReconciler, BoardSnapshot, Column, ColumnHistory,
    Priority, Store, SyncPayload, Task, TaskId, UserId, UserRepository,
};

struct Fixture {
    _dir: tempfile::TempDir,
    store: Store,
    reader: BoardReader,
    reconciler: BoardReconciler,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("kanban.db")).unwrap();
        Self {
            reader: BoardReader::new(store.clone()),
            reconciler: BoardReconciler::new(store.clone()),
            store,
            _dir: dir,
        }
    }

    fn user(&self, provider_id: &str) -> UserId {
        UserRepository::new(self.store.clone())
            .get_or_create_user(
                &format!("{provider_id}@example.com"),
                provider_id,
                "test",
                provider_id,
            )
            .unwrap()
            .id
    }

    fn sync(&self, user: UserId, boards: &[BoardSnapshot]) -> Result<(), BoardError> {
        self.reconciler.sync_boards(
            user,
            &SyncPayload {
                boards: boards.to_vec(),
            },
        )
    }
}

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_735_689_600 + seconds, 0).unwrap()
}

fn column(id: &str, name: &str, order: i64) -> Column {
    Column {
        id: id.to_string(),
        name: name.to_string(),
        color: "#3b82f6".to_string(),
        collapsed: false,
        order,
    }
}

fn task(id: TaskId, column_id: &str, order: i64) -> Task {
    Task {
        id,
        column_id: column_id.to_string(),
        title: "T1".to_string(),
        description: String::new(),
        priority: Priority::Medium,
        due_date: String::new(),
        order,
        creation_date: at(0),
        change_date: at(0),
        done_date: None,
        labels: Vec::new(),
        history: Vec::new(),
    }
}

fn board_b1() -> BoardSnapshot {
    BoardSnapshot {
        id: BoardId::generate(),
        name: "B1".to_string(),
        created_at: at(0),
        columns: vec![column("todo", "To Do", 0)],
        labels: Vec::new(),
        tasks: vec![task(TaskId::generate(), "todo", 0)],
        settings: None,
    }
}

#[test]
fn move_then_remove_task() {
    let fx = Fixture::new();
    let u1 = fx.user("u1");
    let mut b1 = board_b1();
    fx.sync(u1, &[b1.clone()]).unwrap();

    b1.columns.push(column("done", "Done", 1));
    b1.tasks[0].column_id = "done".to_string();
    b1.tasks[0].history = vec![ColumnHistory {
        column_id: "done".to_string(),
        at: at(60),
    }];
    fx.sync(u1, &[b1.clone()]).unwrap();

    let read = fx.reader.get_full_board(u1, b1.id).unwrap();
    let columns: Vec<_> = read.columns.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(columns, ["todo", "done"]);
    assert_eq!(read.tasks.len(), 1);
    assert_eq!(read.tasks[0].column_id, "done");
    assert_eq!(
        read.tasks[0].history,
        vec![ColumnHistory {
            column_id: "done".to_string(),
            at: at(60)
        }]
    );

    b1.tasks.clear();
    fx.sync(u1, &[b1.clone()]).unwrap();
    assert!(fx.reader.get_full_board(u1, b1.id).unwrap().tasks.is_empty());
}

#[test]
fn unauthorized_sync_leaves_owner_state() {
    let fx = Fixture::new();
    let u1 = fx.user("u1");
    let u2 = fx.user("u2");
    let b1 = board_b1();
    fx.sync(u1, &[b1.clone()]).unwrap();
    let before = fx.reader.get_full_board(u1, b1.id).unwrap();

    let mut hijack = b1.clone();
    hijack.name = "mine now".to_string();
    hijack.tasks.clear();
    let err = fx.sync(u2, &[hijack]).unwrap_err();
    assert!(matches!(err, BoardError::Unauthorized(id) if id == b1.id));

    assert_eq!(fx.reader.get_full_board(u1, b1.id).unwrap(), before);
    assert!(fx.reader.list_boards(u2).unwrap().is_empty());
}

#[test]
fn ownership_isolation_for_read_and_delete() {
    let fx = Fixture::new();
    let a = fx.user("a");
    let b = fx.user("b");
    let board = board_b1();
    fx.sync(b, &[board.clone()]).unwrap();

    assert!(matches!(
        fx.reader.get_full_board(a, board.id),
        Err(BoardError::NotFound(_))
    ));
    assert!(matches!(
        fx.reconciler.delete_board(a, board.id),
        Err(BoardError::NotFound(_))
    ));
    assert_eq!(
        fx.reader.get_full_board(b, board.id).unwrap().into_snapshot(),
        board
    );
}

#[test]
fn second_board_failure_rolls_back_first() {
    let fx = Fixture::new();
    let a = fx.user("a");
    let b = fx.user("b");
    let foreign = board_b1();
    fx.sync(b, &[foreign.clone()]).unwrap();

    let mut existing = board_b1();
    fx.sync(a, &[existing.clone()]).unwrap();
    let before = fx.reader.get_full_board(a, existing.id).unwrap();

    existing.name = "changed".to_string();
    existing.tasks.clear();
    let fresh = board_b1();
    assert!(fx.sync(a, &[existing.clone(), fresh.clone(), foreign]).is_err());

    assert_eq!(fx.reader.get_full_board(a, existing.id).unwrap(), before);
    assert!(matches!(
        fx.reader.get_full_board(a, fresh.id),
        Err(BoardError::NotFound(_))
    ));
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kanban.db");
    let board = board_b1();
    let user = {
        let store = Store::open(&path).unwrap();
        let user = UserRepository::new(store.clone())
            .get_or_create_user("p@example.com", "P", "test", "p")
            .unwrap()
            .id;
        BoardReconciler::new(store)
            .sync_boards(
                user,
                &SyncPayload {
                    boards: vec![board.clone()],
                },
            )
            .unwrap();
        user
    };

    let reader = BoardReader::new(Store::open(&path).unwrap());
    assert_eq!(reader.get_full_board(user, board.id).unwrap().into_snapshot(), board);
}

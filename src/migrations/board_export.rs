//! Import of board export files written by the browser client.
//!
//! Two shapes exist: the current `{ boardName, columns, tasks, labels,
//! settings }` object and the original bare array of tasks. Values are
//! normalized the same way the client normalizes them on import.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::{BoardError, BoardResult};
use crate::models::{
    BoardId, BoardSnapshot, Column, ColumnHistory, Label, Priority, Settings, Task, TaskId,
};

const DEFAULT_COLOR: &str = "#3b82f6";

/// Where the board being imported should land.
#[derive(Debug, Clone)]
pub struct ImportTarget {
    pub board_id: BoardId,
    /// Used when the export carries no board name.
    pub fallback_name: String,
    /// Stamp for tasks without creation/change dates.
    pub now: DateTime<Utc>,
}

impl ImportTarget {
    pub fn new(fallback_name: impl Into<String>) -> Self {
        Self {
            board_id: BoardId::generate(),
            fallback_name: fallback_name.into(),
            now: Utc::now(),
        }
    }
}

/// Parses an export file into a snapshot ready for sync.
pub fn snapshot_from_export(content: &str, target: &ImportTarget) -> BoardResult<BoardSnapshot> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| BoardError::validation(format!("export is not valid JSON: {e}")))?;

    let (tasks, columns, labels, settings, board_name) = match &value {
        Value::Array(tasks) => (tasks, None, None, None, None),
        Value::Object(map) => match (map.get("tasks"), map.get("columns")) {
            (Some(Value::Array(tasks)), Some(columns)) => (
                tasks,
                Some(columns),
                map.get("labels"),
                map.get("settings"),
                map.get("boardName").and_then(Value::as_str),
            ),
            _ => return Err(BoardError::validation("export needs tasks and columns")),
        },
        _ => return Err(BoardError::validation("unrecognized export format")),
    };

    let legacy = columns.is_none();
    let mut columns = match columns {
        Some(columns) => normalize_columns(columns)?,
        None => default_columns(),
    };
    let labels = match labels {
        Some(Value::Null) | None => default_labels(),
        Some(labels) => normalize_labels(labels)?,
    };
    let settings = match settings {
        Some(Value::Object(settings)) => Some(normalize_settings(settings)),
        Some(Value::Null) | None => None,
        Some(_) => return Err(BoardError::validation("settings must be an object")),
    };

    let known_labels: HashSet<&str> = labels.iter().map(|l| l.id.as_str()).collect();
    let tasks = tasks
        .iter()
        .enumerate()
        .map(|(idx, task)| normalize_task(task, idx, &known_labels, target.now))
        .collect::<BoardResult<Vec<_>>>()?;

    // Legacy files carry no column list, so any column their tasks sit in
    // beyond the defaults is added after them.
    for task in &tasks {
        if columns.iter().any(|column| column.id == task.column_id) {
            continue;
        }
        if !legacy {
            return Err(BoardError::validation(format!(
                "task {} is in unknown column {}",
                task.id, task.column_id
            )));
        }
        columns.push(Column {
            id: task.column_id.clone(),
            name: task.column_id.clone(),
            color: DEFAULT_COLOR.to_string(),
            collapsed: false,
            order: columns.len() as i64,
        });
    }

    let name = board_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(target.fallback_name.as_str());

    Ok(BoardSnapshot {
        id: target.board_id,
        name: name.to_string(),
        created_at: target.now,
        columns,
        labels,
        tasks,
        settings,
    })
}

fn default_columns() -> Vec<Column> {
    [("todo", "To Do"), ("inprogress", "In Progress"), ("done", "Done")]
        .into_iter()
        .enumerate()
        .map(|(order, (id, name))| Column {
            id: id.to_string(),
            name: name.to_string(),
            color: DEFAULT_COLOR.to_string(),
            collapsed: false,
            order: order as i64,
        })
        .collect()
}

fn default_labels() -> Vec<Label> {
    [
        ("urgent", "Urgent", "#ef4444"),
        ("feature", "Feature", "#3b82f6"),
        ("task", "Task", "#f59e0b"),
    ]
    .into_iter()
    .map(|(id, name, color)| Label {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        group: String::new(),
    })
    .collect()
}

fn normalize_columns(value: &Value) -> BoardResult<Vec<Column>> {
    let items = value
        .as_array()
        .ok_or_else(|| BoardError::validation("columns must be an array"))?;
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let id = text(item.get("id"));
            let name = text(item.get("name"));
            if id.is_empty() || name.is_empty() {
                return Err(BoardError::validation(format!(
                    "column {idx} needs an id and a name"
                )));
            }
            Ok(Column {
                id,
                name,
                color: color_or_default(item.get("color")),
                collapsed: item.get("collapsed").and_then(Value::as_bool).unwrap_or(false),
                order: item.get("order").and_then(Value::as_i64).unwrap_or(idx as i64),
            })
        })
        .collect()
}

fn normalize_labels(value: &Value) -> BoardResult<Vec<Label>> {
    let items = value
        .as_array()
        .ok_or_else(|| BoardError::validation("labels must be an array"))?;
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let id = text(item.get("id"));
            let name = text(item.get("name"));
            if id.is_empty() || name.is_empty() {
                return Err(BoardError::validation(format!(
                    "label {idx} needs an id and a name"
                )));
            }
            Ok(Label {
                id,
                name,
                color: color_or_default(item.get("color")),
                group: text(item.get("group")),
            })
        })
        .collect()
}

fn normalize_settings(map: &Map<String, Value>) -> Settings {
    let defaults = Settings::default();
    let flag = |key: &str| map.get(key).and_then(Value::as_bool) != Some(false);
    Settings {
        show_priority: flag("showPriority"),
        show_due_date: flag("showDueDate"),
        show_age: flag("showAge"),
        show_change_date: flag("showChangeDate"),
        locale: Some(text(map.get("locale")))
            .filter(|locale| !locale.is_empty())
            .unwrap_or(defaults.locale),
        default_priority: map
            .get("defaultPriority")
            .and_then(Value::as_str)
            .map(Priority::parse)
            .unwrap_or(defaults.default_priority),
        notification_days: map
            .get("notificationDays")
            .and_then(Value::as_i64)
            .filter(|days| *days >= 0)
            .unwrap_or(defaults.notification_days),
    }
}

fn normalize_task(
    item: &Value,
    idx: usize,
    known_labels: &HashSet<&str>,
    now: DateTime<Utc>,
) -> BoardResult<Task> {
    let raw_id = text(item.get("id"));
    let title = match item.get("title") {
        Some(Value::String(title)) => title.trim().to_string(),
        _ => text(item.get("text")),
    };
    let column_id = text(item.get("column").or_else(|| item.get("column_id")));
    if raw_id.is_empty() || title.is_empty() || column_id.is_empty() {
        return Err(BoardError::validation(format!(
            "task {idx} needs an id, a title and a column"
        )));
    }
    let id = raw_id
        .parse::<TaskId>()
        .map_err(|_| BoardError::validation(format!("task {idx} has a non-UUID id {raw_id}")))?;

    let creation_date = timestamp(item.get("creationDate")).unwrap_or(now);
    let change_date = timestamp(item.get("changeDate"))
        .or_else(|| timestamp(item.get("changedDate")))
        .unwrap_or(creation_date);

    // Links to labels the board no longer has are dropped, as the client does
    // when rendering.
    let mut labels: Vec<String> = Vec::new();
    if let Some(Value::Array(items)) = item.get("labels") {
        for label in items.iter().map(|l| text(Some(l))) {
            if known_labels.contains(label.as_str()) && !labels.contains(&label) {
                labels.push(label);
            }
        }
    }

    let history = match item.get("columnHistory") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| {
                let column_id = text(entry.get("column"));
                let at = timestamp(entry.get("at"))?;
                (!column_id.is_empty()).then_some(ColumnHistory { column_id, at })
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(Task {
        id,
        column_id,
        title,
        description: text(item.get("description")),
        priority: Priority::parse(item.get("priority").and_then(Value::as_str).unwrap_or("")),
        due_date: normalize_due_date(&text(
            item.get("dueDate").or_else(|| item.get("due-date")),
        )),
        order: item.get("order").and_then(Value::as_i64).unwrap_or(idx as i64),
        creation_date,
        change_date,
        done_date: timestamp(item.get("doneDate")),
        labels,
        history,
    })
}

/// Date-times are cut to their `YYYY-MM-DD` part; anything else is kept.
fn normalize_due_date(value: &str) -> String {
    if value.len() >= 10 && value.contains('T') && value.is_char_boundary(10) {
        value[..10].to_string()
    } else {
        value.to_string()
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn color_or_default(value: Option<&Value>) -> String {
    let color = text(value);
    if is_hex_color(&color) {
        color
    } else {
        DEFAULT_COLOR.to_string()
    }
}

fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => {
            (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

fn timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = value?.as_str()?;
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

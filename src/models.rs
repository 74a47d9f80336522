use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Authenticated acting user, handed in by the auth layer.
    UserId
);
uuid_id!(
    /// Client-minted board identifier.
    BoardId
);
uuid_id!(TaskId);

/// Clients send `null` for fields they never set; read it as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
    #[default]
    None,
}

impl Priority {
    /// Lenient parse: trims and lowercases, anything unknown becomes `None`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "urgent" => Priority::Urgent,
            "high" => Priority::High,
            "medium" => Priority::Medium,
            "low" => Priority::Low,
            _ => Priority::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::None => "none",
        }
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        Priority::parse(&value)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub provider: Option<String>,
    pub provider_id: Option<String>,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Column {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub collapsed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub group: String,
}

/// A task entering a column at a point in time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ColumnHistory {
    #[serde(rename = "column")]
    pub column_id: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub column_id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    /// Kept verbatim, the client owns its format.
    #[serde(default, deserialize_with = "null_as_default")]
    pub due_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: i64,
    pub creation_date: DateTime<Utc>,
    pub change_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_date: Option<DateTime<Utc>>,
    /// Label ids of the owning board.
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
    #[serde(default, rename = "columnHistory", deserialize_with = "null_as_default")]
    pub history: Vec<ColumnHistory>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub show_priority: bool,
    pub show_due_date: bool,
    pub show_age: bool,
    pub show_change_date: bool,
    pub locale: String,
    #[serde(deserialize_with = "null_as_default")]
    pub default_priority: Priority,
    pub notification_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            show_priority: true,
            show_due_date: true,
            show_age: true,
            show_change_date: true,
            locale: "en-US".to_string(),
            default_priority: Priority::None,
            notification_days: 3,
        }
    }
}

/// Board header without nested data, as listed for a user.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BoardSummary {
    pub id: BoardId,
    pub user_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Complete client-side state of one board. Every sync replaces the stored
/// board with this.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub id: BoardId,
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<Column>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<Label>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

/// A stored board with everything nested under it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BoardAggregate {
    pub id: BoardId,
    pub user_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub columns: Vec<Column>,
    pub labels: Vec<Label>,
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl BoardAggregate {
    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            id: self.id,
            user_id: self.user_id,
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }

    pub fn into_snapshot(self) -> BoardSnapshot {
        BoardSnapshot {
            id: self.id,
            name: self.name,
            created_at: self.created_at,
            columns: self.columns,
            labels: self.labels,
            tasks: self.tasks,
            settings: self.settings,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SyncPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub boards: Vec<BoardSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_is_normalized_on_parse() {
        assert_eq!(Priority::parse(" HIGH "), Priority::High);
        assert_eq!(Priority::parse("critical"), Priority::None);
        assert_eq!(Priority::parse(""), Priority::None);

        let parsed: Priority = serde_json::from_str("\"Urgent\"").unwrap();
        assert_eq!(parsed, Priority::Urgent);
        assert_eq!(serde_json::to_string(&Priority::Low).unwrap(), "\"low\"");
    }

    #[test]
    fn snapshot_defaults_missing_collections() {
        let snapshot: BoardSnapshot = serde_json::from_value(serde_json::json!({
            "id": "0b7f8a52-2a39-4cbb-9d4c-2f0f5c9f53a1",
            "name": "Home",
            "created_at": "2025-01-02T03:04:05Z"
        }))
        .unwrap();

        assert!(snapshot.columns.is_empty());
        assert!(snapshot.labels.is_empty());
        assert!(snapshot.tasks.is_empty());
        assert!(snapshot.settings.is_none());
    }

    #[test]
    fn task_uses_client_field_names() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": "6f1f3c1e-8a4e-4c0e-9a57-0d3f2b1c9e11",
            "board_id": "0b7f8a52-2a39-4cbb-9d4c-2f0f5c9f53a1",
            "column_id": "todo",
            "title": "Write tests",
            "priority": "medium",
            "creation_date": "2025-01-02T03:04:05Z",
            "change_date": "2025-01-02T03:04:05Z",
            "labels": ["bug"],
            "columnHistory": [{ "column": "todo", "at": "2025-01-02T03:04:05Z" }]
        }))
        .unwrap();

        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.history.len(), 1);
        assert_eq!(task.history[0].column_id, "todo");

        let value = serde_json::to_value(&task).unwrap();
        assert!(value.get("columnHistory").is_some());
        assert!(value.get("done_date").is_none());
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let settings: Settings =
            serde_json::from_value(serde_json::json!({ "showAge": false })).unwrap();
        assert!(!settings.show_age);
        assert!(settings.show_priority);
        assert_eq!(settings.notification_days, 3);
        assert_eq!(settings.locale, "en-US");
    }

    #[test]
    fn null_task_fields_read_as_defaults() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": "6f1f3c1e-8a4e-4c0e-9a57-0d3f2b1c9e11",
            "column_id": "todo",
            "title": "Write tests",
            "priority": null,
            "labels": null,
            "columnHistory": null,
            "creation_date": "2025-01-02T03:04:05Z",
            "change_date": "2025-01-02T03:04:05Z"
        }))
        .unwrap();

        assert_eq!(task.priority, Priority::None);
        assert!(task.labels.is_empty());
        assert!(task.history.is_empty());

        let payload: SyncPayload = serde_json::from_str("{\"boards\": null}").unwrap();
        assert!(payload.boards.is_empty());
    }
}

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::Entity;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub done: bool,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
}

impl Entity for Task {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for a task the user is about to create.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: String,
    pub title: String,
}

impl NewTask {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
        }
    }

    /// Stamp the task with a client-side id and creation time so the optimistic
    /// copy and the server copy share an identity.
    pub fn into_task(self) -> Task {
        Task {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: self.user_id,
            title: self.title,
            done: false,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Partial update for `PATCH /tasks/:id`.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

/// Ordering of the task list by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortOrder {
    /// Oldest first
    #[default]
    Asc,
    /// Newest first
    Desc,
}

impl SortOrder {
    /// Value of the `_sort` query parameter.
    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::Asc => "createdAt",
            SortOrder::Desc => "-createdAt",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_wire_names() {
        let task: Task = serde_json::from_str(
            r#"{"id":"t1","userId":"u1","title":"Buy milk","done":true,"createdAt":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(task.user_id, "u1");
        assert!(task.done);
        assert_eq!(task.created_at, 1_700_000_000_000);

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["createdAt"], 1_700_000_000_000_i64);
    }

    #[test]
    fn test_task_missing_optional_fields() {
        let task: Task =
            serde_json::from_str(r#"{"id":"t1","userId":"u1","title":"x"}"#).unwrap();
        assert!(!task.done);
        assert_eq!(task.created_at, 0);
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = TaskPatch {
            done: Some(true),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"done":true}"#);
    }

    #[test]
    fn test_new_task_gets_identity() {
        let a = NewTask::new("u1", "Buy milk").into_task();
        let b = NewTask::new("u1", "Buy milk").into_task();
        assert_ne!(a.id, b.id);
        assert!(!a.done);
        assert!(a.created_at > 0);
    }

    #[test]
    fn test_sort_order_params() {
        assert_eq!(SortOrder::Asc.as_param(), "createdAt");
        assert_eq!(SortOrder::Desc.as_param(), "-createdAt");
        assert_eq!(SortOrder::Asc.toggled(), SortOrder::Desc);
        assert_eq!("DESC".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}

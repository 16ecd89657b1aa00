use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::user::UserId;

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Pending,
    /// Task is currently being worked on.
    InProgress,
    /// Task is finished.
    Completed,
}

/// Payload for creating a task.
///
/// Any `id`, `user_id` or timestamp sent by the client is ignored: unknown
/// fields are dropped during deserialization and the owner comes from the token.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Maximum length of 1000 characters if provided. Stored as an empty string when absent.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Defaults to `pending`.
    pub status: Option<TaskStatus>,
}

/// Partial update of a task; only the fields present are changed.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,
}

/// Represents a task as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Identifier of the owning user. Never changes after creation.
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Builds a task owned by `user_id` from client input, with both timestamps set to now.
    /// The id is assigned by the store.
    pub fn new(id: i64, input: &TaskInput, user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: input.title.clone(),
            description: input.description.clone().unwrap_or_default(),
            status: input.status.unwrap_or_default(),
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the fields present in `changes` and bumps `updated_at`.
    pub fn apply(&mut self, changes: &TaskUpdate) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_creation() {
        let input = TaskInput {
            title: "Test Task".to_string(),
            description: None,
            status: None,
        };

        let task = Task::new(1, &input, 42);
        assert_eq!(task.title, "Test Task");
        assert_eq!(task.description, "");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.user_id, 42);
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn test_client_user_id_is_ignored() {
        let input: TaskInput = serde_json::from_value(serde_json::json!({
            "title": "Mine",
            "user_id": 999,
            "status": "in_progress"
        }))
        .unwrap();

        let task = Task::new(1, &input, 5);
        assert_eq!(task.user_id, 5);
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[test]
    fn test_partial_update() {
        let input = TaskInput {
            title: "Original".to_string(),
            description: Some("Keep me".to_string()),
            status: None,
        };
        let mut task = Task::new(1, &input, 1);

        task.apply(&TaskUpdate {
            status: Some(TaskStatus::Completed),
            ..TaskUpdate::default()
        });

        assert_eq!(task.title, "Original");
        assert_eq!(task.description, "Keep me");
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.updated_at >= task.created_at);
    }

    #[test]
    fn test_task_validation() {
        let valid_input = TaskInput {
            title: "Valid Task".to_string(),
            description: Some("Valid Description".to_string()),
            status: Some(TaskStatus::Pending),
        };
        assert!(valid_input.validate().is_ok());

        let empty_title = TaskInput {
            title: "".to_string(),
            description: None,
            status: None,
        };
        assert!(empty_title.validate().is_err());

        let long_description = TaskInput {
            title: "Valid title".to_string(),
            description: Some("b".repeat(1001)),
            status: None,
        };
        assert!(long_description.validate().is_err());

        assert!(TaskUpdate::default().validate().is_ok());
        let blank_update = TaskUpdate {
            title: Some(String::new()),
            ..TaskUpdate::default()
        };
        assert!(blank_update.validate().is_err());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), "in_progress");
        assert_eq!(serde_json::to_value(TaskStatus::Completed).unwrap(), "completed");
        assert!(serde_json::from_value::<TaskStatus>(serde_json::json!("done")).is_err());
    }
}

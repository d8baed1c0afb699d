use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Where a task sits on the board. A task has exactly one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "todo", alias = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "review")]
    Review,
    #[serde(rename = "completed")]
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Completed,
    ];

    /// Statuses a task card offers as buttons.
    pub const CARD: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "To do",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Review => "Review",
            TaskStatus::Completed => "Completed",
        }
    }

    /// Name of the storage partition holding tasks with this status.
    pub fn partition_name(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Completed => "completed",
        }
    }

    /// Completed tasks reopen as pending; everything else completes.
    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Completed => TaskStatus::Pending,
            _ => TaskStatus::Completed,
        }
    }

    pub fn is_completed(self) -> bool {
        self == TaskStatus::Completed
    }

    /// Neighbouring column, clamped to the board edges.
    pub fn shifted(self, direction: isize) -> Self {
        let index = Self::ALL.iter().position(|s| *s == self).unwrap_or(0) as isize;
        let next = (index + direction).clamp(0, Self::ALL.len() as isize - 1) as usize;
        Self::ALL[next]
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.partition_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown task status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "todo" | "pending" => Ok(TaskStatus::Pending),
            "in-progress" | "inprogress" | "doing" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "completed" | "done" => Ok(TaskStatus::Completed),
            _ => Err(ParseStatusError(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    /// A fresh pending task with a random id.
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: None,
            title: title.into(),
            description: non_empty(description),
            status: TaskStatus::Pending,
            created_at: Some(Utc::now()),
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}

/// Fields of a task about to be created by the task gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
}

impl NewTask {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
            description: non_empty(description),
            status: TaskStatus::Pending,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = non_empty(Some(description.clone()));
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TaskStatus::Pending)]
    #[case(TaskStatus::Completed)]
    fn toggling_twice_restores_status(#[case] status: TaskStatus) {
        assert_eq!(status.toggled().toggled(), status);
    }

    #[test]
    fn toggling_unfinished_work_completes_it() {
        assert_eq!(TaskStatus::InProgress.toggled(), TaskStatus::Completed);
        assert_eq!(TaskStatus::Review.toggled(), TaskStatus::Completed);
    }

    #[rstest]
    #[case("todo", TaskStatus::Pending)]
    #[case("pending", TaskStatus::Pending)]
    #[case("in-progress", TaskStatus::InProgress)]
    #[case("review", TaskStatus::Review)]
    #[case("Completed", TaskStatus::Completed)]
    fn parses_status_names(#[case] input: &str, #[case] expected: TaskStatus) {
        assert_eq!(input.parse::<TaskStatus>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_status() {
        assert!("archived".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn status_uses_wire_names() {
        assert_eq!(serde_json::to_string(&TaskStatus::Pending).unwrap(), "\"todo\"");
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"pending\"").unwrap(),
            TaskStatus::Pending
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
    }

    #[test]
    fn shifting_clamps_at_board_edges() {
        assert_eq!(TaskStatus::Pending.shifted(-1), TaskStatus::Pending);
        assert_eq!(TaskStatus::Pending.shifted(1), TaskStatus::InProgress);
        assert_eq!(TaskStatus::Completed.shifted(1), TaskStatus::Completed);
    }

    #[test]
    fn blank_description_is_dropped() {
        let task = Task::new("Buy paper", Some("   ".to_string()));
        assert_eq!(task.description, None);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut task = Task::new("A", Some("desc".to_string()));
        TaskPatch::status(TaskStatus::Review).apply(&mut task);
        assert_eq!(task.title, "A");
        assert_eq!(task.description.as_deref(), Some("desc"));
        assert_eq!(task.status, TaskStatus::Review);
    }
}

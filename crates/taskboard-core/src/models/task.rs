//! Task model and the field-level payloads used to create and edit tasks.

use std::{cmp::Ordering, fmt};

use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};

use super::{Priority, TaskStatus};
use crate::error::{BoardError, Result};

/// Assignee sentinel for tasks nobody has picked up.
pub const UNASSIGNED: &str = "Unassigned";

const TEMPORARY_PREFIX: &str = "local-";
const UNTITLED: &str = "Untitled Task";

/// Identifier of a task.
///
/// Remote ids arrive as either strings or integers; both are kept as text.
/// Ordering compares numerically when both ids are integers, so `7` sorts
/// before `10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct TaskId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl From<RawId> for TaskId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => TaskId(n.to_string()),
            RawId::Text(s) => TaskId(s),
        }
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh placeholder id for a task the remote store has not seen yet.
    pub fn temporary() -> Self {
        Self(format!("{TEMPORARY_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    /// Whether this id is a local placeholder.
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for TaskId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<u64>(), other.0.parse::<u64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for TaskId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A unit of work on the board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,

    /// Position in the whole collection; unsequenced tasks sort last
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,

    #[serde(default, deserialize_with = "string_or_null")]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default, alias = "assigned_user", deserialize_with = "string_or_null")]
    pub assigned_to: String,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default, alias = "task_type", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,

    #[serde(default, alias = "due", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    #[serde(default, alias = "acceptance_criteria", skip_serializing_if = "Vec::is_empty")]
    pub acceptance_criteria: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    /// Last remote modification, when the remote store reports one
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<Timestamp>,
}

fn string_or_null<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse::<Timestamp>().ok()))
}

impl Task {
    /// Creates a task with defaults for every descriptive field.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sequence: None,
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            assigned_to: UNASSIGNED.to_string(),
            priority: Priority::Medium,
            task_type: None,
            due_date: None,
            acceptance_criteria: Vec::new(),
            dependencies: Vec::new(),
            updated_at: None,
        }
    }

    /// Enforces the store invariants on data of unknown provenance.
    ///
    /// `status` is already folded into the closed set during
    /// deserialization; this fixes up the assignee, blank titles, and empty
    /// descriptions.
    pub fn normalize(&mut self) {
        let trimmed = self.assigned_to.trim();
        self.assigned_to = if trimmed.is_empty() {
            UNASSIGNED.to_string()
        } else {
            trimmed.to_string()
        };
        if self.title.trim().is_empty() {
            self.title = UNTITLED.to_string();
        }
        if self.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            self.description = None;
        }
    }

    /// Total order used by the store and within every projected column:
    /// sequenced before unsequenced, ascending sequence, then id, then
    /// priority.
    pub fn board_order(&self, other: &Self) -> Ordering {
        let by_sequence = match (self.sequence, other.sequence) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_sequence
            .then_with(|| self.id.cmp(&other.id))
            .then_with(|| self.priority.cmp(&other.priority))
    }

    /// Whether the assignee is a real person rather than a leaked status.
    pub fn has_person_assignee(&self) -> bool {
        !self.assigned_to.is_empty() && !TaskStatus::is_sentinel(&self.assigned_to)
    }
}

/// Partial update of a task's fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Rejects patches that would break a task invariant.
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(BoardError::validation("title").with_reason("Title cannot be empty"));
            }
        }
        if let Some(assignee) = &self.assigned_to {
            if TaskStatus::is_sentinel(assignee.trim()) {
                return Err(BoardError::validation("assignedTo")
                    .with_reason(format!("'{assignee}' is a status, not an assignee")));
            }
        }
        Ok(())
    }

    /// Writes every set field into `task` and re-normalizes it.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone()).filter(|d| !d.is_empty());
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(assignee) = &self.assigned_to {
            task.assigned_to = assignee.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(sequence) = self.sequence {
            task.sequence = Some(sequence);
        }
        if let Some(task_type) = &self.task_type {
            task.task_type = Some(task_type.clone());
        }
        if let Some(due) = &self.due_date {
            task.due_date = Some(due.clone()).filter(|d| !d.is_empty());
        }
        if let Some(criteria) = &self.acceptance_criteria {
            task.acceptance_criteria = criteria.clone();
        }
        if let Some(deps) = &self.dependencies {
            task.dependencies = deps.clone();
        }
        task.normalize();
    }

    /// Patch carrying the fields that differ between `before` and `after`.
    pub fn diff(before: &Task, after: &Task) -> Self {
        fn changed<T: PartialEq + Clone>(a: &T, b: &T) -> Option<T> {
            (a != b).then(|| b.clone())
        }
        Self {
            title: changed(&before.title, &after.title),
            description: changed(&before.description, &after.description)
                .map(Option::unwrap_or_default),
            status: changed(&before.status, &after.status),
            assigned_to: changed(&before.assigned_to, &after.assigned_to),
            priority: changed(&before.priority, &after.priority),
            sequence: changed(&before.sequence, &after.sequence).flatten(),
            task_type: changed(&before.task_type, &after.task_type).flatten(),
            due_date: changed(&before.due_date, &after.due_date).map(Option::unwrap_or_default),
            acceptance_criteria: changed(&before.acceptance_criteria, &after.acceptance_criteria),
            dependencies: changed(&before.dependencies, &after.dependencies),
        }
    }
}

/// Fields supplied by the user when adding a task by hand.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(BoardError::validation("title").with_reason("Task title is required"));
        }
        if let Some(assignee) = &self.assigned_to {
            if TaskStatus::is_sentinel(assignee.trim()) {
                return Err(BoardError::validation("assignedTo")
                    .with_reason(format!("'{assignee}' is a status, not an assignee")));
            }
        }
        Ok(())
    }

    /// Materializes the task under `id`.
    pub fn into_task(self, id: TaskId, sequence: Option<i64>) -> Task {
        let mut task = Task {
            id,
            sequence,
            title: self.title.trim().to_string(),
            description: self.description.filter(|d| !d.trim().is_empty()),
            status: self.status,
            assigned_to: self.assigned_to.unwrap_or_default(),
            priority: self.priority,
            task_type: self.task_type.or_else(|| Some("Feature".to_string())),
            due_date: self.due_date.filter(|d| !d.is_empty()),
            acceptance_criteria: self.acceptance_criteria,
            dependencies: self.dependencies,
            updated_at: None,
        };
        task.normalize();
        task
    }
}

//! Closed enumerations: task status, priority, project lifecycle, view mode.
//!
//! Remote payloads are not trusted to stay inside these sets. Deserialization
//! therefore goes through the lenient `normalize` constructors, while
//! [`FromStr`] stays strict for user-facing input such as CLI arguments and
//! column keys.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "kebab-case", from = "Option<String>")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Todo,

    /// Being worked on
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Every status, in board column order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Canonical wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }

    /// Human-readable column heading.
    pub fn title(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    /// Maps any incoming status string onto the closed set.
    ///
    /// Known spellings of "in progress" (including the bare `progress` some
    /// generators emit) map to [`TaskStatus::InProgress`]; anything
    /// unrecognized falls back to [`TaskStatus::Todo`].
    pub fn normalize(raw: &str) -> Self {
        let folded: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        match folded.as_str() {
            "inprogress" | "progress" | "doing" => TaskStatus::InProgress,
            "done" | "complete" | "completed" => TaskStatus::Done,
            _ => TaskStatus::Todo,
        }
    }

    /// Whether `value` is one of the canonical status strings.
    ///
    /// Used to keep status values that leaked into `assignedTo` from being
    /// treated as people.
    pub fn is_sentinel(value: &str) -> bool {
        Self::ALL.iter().any(|s| s.as_str() == value)
    }
}

impl From<Option<String>> for TaskStatus {
    fn from(raw: Option<String>) -> Self {
        raw.map(Self::from).unwrap_or_default()
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        Self::normalize(&raw)
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(format!("Invalid task status: {s}")),
        }
    }
}

/// Task priority. Declaration order is the sort order (`High` first).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(from = "Option<String>")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Case-insensitive parse; unknown values become `Medium`.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "high" => Priority::High,
            "low" => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

impl From<Option<String>> for Priority {
    fn from(raw: Option<String>) -> Self {
        raw.map(Self::from).unwrap_or_default()
    }
}

impl From<String> for Priority {
    fn from(raw: String) -> Self {
        Self::normalize(&raw)
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("Invalid priority: {s}")),
        }
    }
}

/// Lifecycle of a project whose tasks are produced by the generation service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum LifecycleStatus {
    /// Tasks are still being produced
    Generating,

    /// Tasks are available
    #[default]
    Completed,

    /// Generation ended with an error
    Failed,
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Generating => "generating",
            LifecycleStatus::Completed => "completed",
            LifecycleStatus::Failed => "failed",
        }
    }

    /// Terminal states stop generation polling.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LifecycleStatus::Generating)
    }
}

impl From<Option<String>> for LifecycleStatus {
    fn from(raw: Option<String>) -> Self {
        raw.map(Self::from).unwrap_or_default()
    }
}

impl From<String> for LifecycleStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "generating" | "pending" | "processing" => LifecycleStatus::Generating,
            "failed" | "error" => LifecycleStatus::Failed,
            _ => LifecycleStatus::Completed,
        }
    }
}

/// How board columns are derived from the task set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    /// One column per status
    Status,

    /// One column per assignee
    User,

    /// One column per (assignee, status) pair
    #[default]
    UserStatus,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Status => "status",
            ViewMode::User => "user",
            ViewMode::UserStatus => "user-status",
        }
    }

    /// Whether columns are keyed by assignee.
    pub fn groups_by_assignee(&self) -> bool {
        !matches!(self, ViewMode::Status)
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "status" => Ok(ViewMode::Status),
            "user" => Ok(ViewMode::User),
            "user-status" | "user_status" | "userstatus" => Ok(ViewMode::UserStatus),
            _ => Err(format!("Invalid view mode: {s}")),
        }
    }
}

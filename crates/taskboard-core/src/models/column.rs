//! Column keys and derived columns.
//!
//! Column keys are structured values. The string form exists only at the
//! presentation boundary and always goes through [`ColumnKey::encode`] and
//! [`ColumnKey::decode`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Task, TaskId, TaskStatus, ViewMode};
use crate::error::{BoardError, Result};

/// Separator between assignee and status in encoded `user-status` keys.
pub const KEY_SEPARATOR: char = '-';

/// Identity of a board column under some view mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ColumnKey {
    Status { status: TaskStatus },
    Assignee { assignee: String },
    AssigneeStatus { assignee: String, status: TaskStatus },
}

impl ColumnKey {
    pub fn status(status: TaskStatus) -> Self {
        Self::Status { status }
    }

    pub fn assignee(assignee: impl Into<String>) -> Self {
        Self::Assignee {
            assignee: assignee.into(),
        }
    }

    pub fn assignee_status(assignee: impl Into<String>, status: TaskStatus) -> Self {
        Self::AssigneeStatus {
            assignee: assignee.into(),
            status,
        }
    }

    /// View mode this key belongs to.
    pub fn view_mode(&self) -> ViewMode {
        match self {
            Self::Status { .. } => ViewMode::Status,
            Self::Assignee { .. } => ViewMode::User,
            Self::AssigneeStatus { .. } => ViewMode::UserStatus,
        }
    }

    /// Status targeted by the column, if the key carries one.
    pub fn target_status(&self) -> Option<TaskStatus> {
        match self {
            Self::Status { status } | Self::AssigneeStatus { status, .. } => Some(*status),
            Self::Assignee { .. } => None,
        }
    }

    /// Assignee targeted by the column, if the key carries one.
    pub fn target_assignee(&self) -> Option<&str> {
        match self {
            Self::Assignee { assignee } | Self::AssigneeStatus { assignee, .. } => Some(assignee),
            Self::Status { .. } => None,
        }
    }

    /// Whether `task` belongs in this column.
    pub fn contains(&self, task: &Task) -> bool {
        match self {
            Self::Status { status } => task.status == *status,
            Self::Assignee { assignee } => task.assigned_to == *assignee,
            Self::AssigneeStatus { assignee, status } => {
                task.assigned_to == *assignee && task.status == *status
            }
        }
    }

    /// The column `task` falls into under `mode`, or `None` when the task is
    /// excluded from that mode (status strings leaked into the assignee).
    pub fn for_task(task: &Task, mode: ViewMode) -> Option<Self> {
        match mode {
            ViewMode::Status => Some(Self::status(task.status)),
            _ if !task.has_person_assignee() => None,
            ViewMode::User => Some(Self::assignee(task.assigned_to.clone())),
            ViewMode::UserStatus => {
                Some(Self::assignee_status(task.assigned_to.clone(), task.status))
            }
        }
    }

    /// String form used by drag-and-drop front ends, e.g. `alice-in-progress`.
    pub fn encode(&self) -> String {
        match self {
            Self::Status { status } => status.as_str().to_string(),
            Self::Assignee { assignee } => assignee.clone(),
            Self::AssigneeStatus { assignee, status } => {
                format!("{assignee}{KEY_SEPARATOR}{}", status.as_str())
            }
        }
    }

    /// Parses an encoded key under `mode`.
    ///
    /// `user-status` keys are matched against the known status suffixes, so
    /// both `in-progress` and assignees such as `mary-jane` survive the
    /// separator.
    pub fn decode(mode: ViewMode, raw: &str) -> Result<Self> {
        let invalid = |reason: &str| BoardError::InvalidColumnKey {
            key: raw.to_string(),
            reason: reason.to_string(),
        };

        match mode {
            ViewMode::Status => raw
                .parse::<TaskStatus>()
                .map(Self::status)
                .map_err(|_| invalid("not a status")),
            ViewMode::User => {
                if raw.is_empty() || TaskStatus::is_sentinel(raw) {
                    Err(invalid("not an assignee"))
                } else {
                    Ok(Self::assignee(raw))
                }
            }
            ViewMode::UserStatus => TaskStatus::ALL
                .iter()
                .find_map(|status| {
                    let assignee = raw
                        .strip_suffix(status.as_str())?
                        .strip_suffix(KEY_SEPARATOR)?;
                    (!assignee.is_empty()).then(|| Self::assignee_status(assignee, *status))
                })
                .ok_or_else(|| invalid("expected '<assignee>-<status>'")),
        }
    }

    /// Heading shown above the column.
    pub fn title(&self) -> String {
        match self {
            Self::Status { status } | Self::AssigneeStatus { status, .. } => {
                status.title().to_string()
            }
            Self::Assignee { assignee } => assignee.clone(),
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// A derived, never-persisted group of tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub key: ColumnKey,
    pub title: String,
    pub tasks: Vec<Task>,
}

impl Column {
    pub fn new(key: ColumnKey) -> Self {
        Self {
            title: key.title(),
            key,
            tasks: Vec::new(),
        }
    }

    /// Index of `task_id` within this column's ordered tasks.
    pub fn position_of(&self, task_id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == task_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

//! Data models for tasks, projects and board columns.
//!
//! Display implementations for these models live in
//! [`crate::display::models`], keeping data structures separate from
//! presentation.
//!
//! # Ingestion
//!
//! Everything that crosses the remote boundary is normalized on the way in:
//!
//! - **Status**: folded into `todo | in-progress | done`
//!   ([`TaskStatus::normalize`]); `progress` becomes `in-progress`, anything
//!   unknown becomes `todo`
//! - **Assignee**: blank values become [`UNASSIGNED`] ([`Task::normalize`])
//! - **Priority**: case-insensitive, defaulting to `Medium`
//!
//! # Examples
//!
//! ```rust
//! use taskboard_core::models::{Task, TaskStatus};
//!
//! let mut task: Task = serde_json::from_str(
//!     r#"{"id": 7, "title": "Login form", "status": "progress", "assignedTo": ""}"#,
//! )
//! .unwrap();
//! task.normalize();
//!
//! assert_eq!(task.status, TaskStatus::InProgress);
//! assert_eq!(task.assigned_to, "Unassigned");
//! ```

pub mod column;
pub mod filters;
pub mod project;
pub mod status;
pub mod summary;
pub mod task;

#[cfg(test)]
mod tests;

pub use column::{Column, ColumnKey, KEY_SEPARATOR};
pub use filters::BoardFilter;
pub use project::{NewProject, Project, ProjectId, ProjectStatus};
pub use status::{LifecycleStatus, Priority, TaskStatus, ViewMode};
pub use summary::{BoardStats, ProjectGroups};
pub use task::{NewTask, Task, TaskId, TaskPatch, UNASSIGNED};

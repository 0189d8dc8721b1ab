//! Project model.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{LifecycleStatus, Task};
use crate::error::{BoardError, Result};

/// Identifier of a project in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A set of tasks produced from one project description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Creator of the project
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    /// Set for projects shared with a group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    /// Projects that predate generation tracking count as completed
    #[serde(default, alias = "status")]
    pub lifecycle_status: LifecycleStatus,

    /// Failure reason reported by the generation service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Reported by metadata-only listings in place of full task bodies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_count: Option<usize>,

    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Project {
    /// Whether the project belongs to a group rather than an individual.
    pub fn is_group(&self) -> bool {
        self.group_id.as_deref().is_some_and(|g| !g.is_empty())
    }

    /// Number of tasks, preferring loaded bodies over the reported count.
    pub fn task_total(&self) -> usize {
        if self.tasks.is_empty() {
            self.task_count.unwrap_or(0)
        } else {
            self.tasks.len()
        }
    }
}

/// Generation status reported for a single project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectStatus {
    pub status: LifecycleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Payload registering a freshly described project with the remote store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    #[serde(rename = "userId")]
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub title: String,
    pub description: String,
    /// Tasks already produced by the generation service, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,
}

impl NewProject {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(BoardError::validation("title").with_reason("Project title is required"));
        }
        if self.owner_id.trim().is_empty() {
            return Err(BoardError::validation("userId").with_reason("Projects need an owner"));
        }
        Ok(())
    }
}

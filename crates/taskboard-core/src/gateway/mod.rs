//! Interface to the remote project/task API.
//!
//! The board only talks to the remote store through [`RemoteGateway`]; the
//! gateway never touches the task store itself. [`memory::InMemoryGateway`]
//! is a complete implementation backed by process memory, used for guest
//! boards and tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewProject, Project, ProjectId, ProjectStatus, Task, TaskId, TaskPatch};

pub mod memory;

pub use memory::InMemoryGateway;

/// Failure of a remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The remote store does not know the resource
    #[error("{resource} not found")]
    NotFound { resource: String },
    /// The remote store answered with an error status
    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    /// The request never completed
    #[error("Transport error: {0}")]
    Transport(String),
    /// The response body did not have the expected shape
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for gateway calls
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Remote project and task operations.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Projects owned by (or shared with) `owner_id`.
    async fn list_projects(&self, owner_id: &str) -> GatewayResult<Vec<Project>>;

    /// A project together with its tasks.
    async fn get_project(&self, project_id: &ProjectId) -> GatewayResult<Project>;

    /// Generation state of a project.
    async fn get_project_status(&self, project_id: &ProjectId) -> GatewayResult<ProjectStatus>;

    async fn create_project(&self, project: &NewProject) -> GatewayResult<ProjectId>;

    async fn delete_project(&self, project_id: &ProjectId) -> GatewayResult<()>;

    /// Updates the given fields of a task.
    async fn patch_task(&self, task_id: &TaskId, patch: &TaskPatch) -> GatewayResult<()>;

    /// Creates a task; returns the permanent id assigned by the remote store.
    async fn create_task(&self, project_id: &ProjectId, task: &Task) -> GatewayResult<TaskId>;

    async fn delete_task(&self, project_id: &ProjectId, task_id: &TaskId) -> GatewayResult<()>;
}

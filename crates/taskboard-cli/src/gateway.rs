//! [`RemoteGateway`] over the project/task HTTP API.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use taskboard_core::{
    gateway::{GatewayError, GatewayResult, RemoteGateway},
    models::{NewProject, Project, ProjectId, ProjectStatus, Task, TaskId, TaskPatch},
};

#[derive(Debug, Deserialize)]
struct ProjectList {
    #[serde(default)]
    projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedProject {
    project_id: ProjectId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedTask {
    task_id: TaskId,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the task API.
pub struct HttpGateway {
    base_url: String,
    client: Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        debug!("{method} {url}");
        self.client.request(method, url)
    }

    /// Sends the request and returns the body of a successful response.
    async fn send(&self, request: RequestBuilder, resource: &str) -> GatewayResult<String> {
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::not_found(resource));
        }
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> GatewayResult<T> {
        let body = self.send(request, resource).await?;
        serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn list_projects(&self, owner_id: &str) -> GatewayResult<Vec<Project>> {
        let request = self
            .request(Method::GET, "/api/projects")
            .query(&[("userId", owner_id)]);
        let list: ProjectList = self.fetch(request, "Projects").await?;
        Ok(list.projects)
    }

    async fn get_project(&self, project_id: &ProjectId) -> GatewayResult<Project> {
        let request = self.request(Method::GET, &format!("/api/projects/{project_id}"));
        self.fetch(request, &format!("Project {project_id}")).await
    }

    // The API has no dedicated status route; the project document carries
    // the generation state.
    async fn get_project_status(&self, project_id: &ProjectId) -> GatewayResult<ProjectStatus> {
        let project = self.get_project(project_id).await?;
        Ok(ProjectStatus {
            status: project.lifecycle_status,
            error: project.error,
        })
    }

    async fn create_project(&self, new_project: &NewProject) -> GatewayResult<ProjectId> {
        let request = self.request(Method::POST, "/api/projects").json(new_project);
        let created: CreatedProject = self.fetch(request, "Projects").await?;
        Ok(created.project_id)
    }

    async fn delete_project(&self, project_id: &ProjectId) -> GatewayResult<()> {
        let request = self.request(Method::DELETE, &format!("/api/projects/{project_id}"));
        self.send(request, &format!("Project {project_id}")).await?;
        Ok(())
    }

    async fn patch_task(&self, task_id: &TaskId, patch: &TaskPatch) -> GatewayResult<()> {
        let request = self
            .request(Method::PATCH, &format!("/api/tasks/{task_id}"))
            .json(patch);
        self.send(request, &format!("Task {task_id}")).await?;
        Ok(())
    }

    async fn create_task(&self, project_id: &ProjectId, task: &Task) -> GatewayResult<TaskId> {
        let request = self
            .request(Method::POST, &format!("/api/projects/{project_id}/tasks"))
            .json(task);
        let created: CreatedTask = self.fetch(request, &format!("Project {project_id}")).await?;
        Ok(created.task_id)
    }

    async fn delete_task(&self, _project_id: &ProjectId, task_id: &TaskId) -> GatewayResult<()> {
        let request = self.request(Method::DELETE, &format!("/api/tasks/{task_id}"));
        self.send(request, &format!("Task {task_id}")).await?;
        Ok(())
    }
}

//! Process-local [`RemoteGateway`].

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use jiff::Timestamp;

use super::{GatewayError, GatewayResult, RemoteGateway};
use crate::models::{
    LifecycleStatus, NewProject, Project, ProjectId, ProjectStatus, Task, TaskId, TaskPatch,
};

const FIRST_TASK_ID: u64 = 1000;

#[derive(Default)]
struct State {
    projects: BTreeMap<ProjectId, Project>,
    /// Status answers handed out before falling back to the stored project
    status_script: HashMap<ProjectId, VecDeque<ProjectStatus>>,
    failure: Option<GatewayError>,
    calls: Vec<String>,
    next_project: u64,
    next_task: u64,
}

/// Remote store kept in memory.
///
/// Besides serving the board, it lets tests script generation progress,
/// inject failures, simulate edits made elsewhere, and inspect the calls it
/// received.
#[derive(Default)]
pub struct InMemoryGateway {
    state: Mutex<State>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a project.
    pub fn with_project(self, project: Project) -> Self {
        self.insert_project(project);
        self
    }

    pub fn insert_project(&self, project: Project) {
        self.state().projects.insert(project.id.clone(), project);
    }

    /// Makes every following call fail with `error` until [`Self::recover`].
    pub fn fail_with(&self, error: GatewayError) {
        self.state().failure = Some(error);
    }

    pub fn recover(&self) {
        self.state().failure = None;
    }

    /// Queues status answers for `project_id`. A `completed` or `failed`
    /// answer is also written to the stored project when it is served.
    pub fn script_statuses(&self, project_id: &ProjectId, statuses: Vec<ProjectStatus>) {
        self.state()
            .status_script
            .insert(project_id.clone(), statuses.into());
    }

    /// Replaces a task as if someone else had edited it remotely.
    pub fn put_task(&self, project_id: &ProjectId, task: Task) {
        let mut state = self.state();
        if let Some(project) = state.projects.get_mut(project_id) {
            match project.tasks.iter_mut().find(|t| t.id == task.id) {
                Some(existing) => *existing = task,
                None => project.tasks.push(task),
            }
        }
    }

    /// Current remote copy of a project.
    pub fn project(&self, project_id: &ProjectId) -> Option<Project> {
        self.state().projects.get(project_id).cloned()
    }

    /// Names of the calls received so far, e.g. `patch_task:7`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the call and returns the injected failure, if any.
    fn begin(&self, call: String) -> GatewayResult<MutexGuard<'_, State>> {
        let mut state = self.state();
        state.calls.push(call);
        match &state.failure {
            Some(error) => Err(error.clone()),
            None => Ok(state),
        }
    }
}

fn project_not_found(id: &ProjectId) -> GatewayError {
    GatewayError::not_found(format!("Project {id}"))
}

#[async_trait]
impl RemoteGateway for InMemoryGateway {
    async fn list_projects(&self, owner_id: &str) -> GatewayResult<Vec<Project>> {
        let state = self.begin(format!("list_projects:{owner_id}"))?;
        Ok(state
            .projects
            .values()
            .filter(|p| p.owner_id.as_deref() == Some(owner_id) || p.is_group())
            .map(|p| Project {
                task_count: Some(p.tasks.len()),
                tasks: Vec::new(),
                ..p.clone()
            })
            .collect())
    }

    async fn get_project(&self, project_id: &ProjectId) -> GatewayResult<Project> {
        let state = self.begin(format!("get_project:{project_id}"))?;
        state
            .projects
            .get(project_id)
            .cloned()
            .ok_or_else(|| project_not_found(project_id))
    }

    async fn get_project_status(&self, project_id: &ProjectId) -> GatewayResult<ProjectStatus> {
        let mut state = self.begin(format!("get_project_status:{project_id}"))?;
        let scripted = state
            .status_script
            .get_mut(project_id)
            .and_then(VecDeque::pop_front);
        let project = state
            .projects
            .get_mut(project_id)
            .ok_or_else(|| project_not_found(project_id))?;

        match scripted {
            Some(status) => {
                if status.status.is_terminal() {
                    project.lifecycle_status = status.status;
                    project.error = status.error.clone();
                }
                Ok(status)
            }
            None => Ok(ProjectStatus {
                status: project.lifecycle_status,
                error: project.error.clone(),
            }),
        }
    }

    async fn create_project(&self, new_project: &NewProject) -> GatewayResult<ProjectId> {
        let mut state = self.begin(format!("create_project:{}", new_project.title))?;
        state.next_project += 1;
        let id = ProjectId::new(format!("project-{}", state.next_project));
        let lifecycle_status = if new_project.tasks.is_empty() {
            LifecycleStatus::Generating
        } else {
            LifecycleStatus::Completed
        };
        let project = Project {
            id: id.clone(),
            title: new_project.title.clone(),
            description: Some(new_project.description.clone()),
            owner_id: Some(new_project.owner_id.clone()),
            group_id: new_project.group_id.clone(),
            lifecycle_status,
            error: None,
            task_count: None,
            tasks: new_project.tasks.clone(),
        };
        state.projects.insert(id.clone(), project);
        Ok(id)
    }

    async fn delete_project(&self, project_id: &ProjectId) -> GatewayResult<()> {
        let mut state = self.begin(format!("delete_project:{project_id}"))?;
        state
            .projects
            .remove(project_id)
            .map(|_| ())
            .ok_or_else(|| project_not_found(project_id))
    }

    async fn patch_task(&self, task_id: &TaskId, patch: &TaskPatch) -> GatewayResult<()> {
        let mut state = self.begin(format!("patch_task:{task_id}"))?;
        let task = state
            .projects
            .values_mut()
            .flat_map(|p| p.tasks.iter_mut())
            .find(|t| &t.id == task_id)
            .ok_or_else(|| GatewayError::not_found(format!("Task {task_id}")))?;
        patch.apply_to(task);
        task.updated_at = Some(Timestamp::now());
        Ok(())
    }

    async fn create_task(&self, project_id: &ProjectId, task: &Task) -> GatewayResult<TaskId> {
        let mut state = self.begin(format!("create_task:{project_id}"))?;
        if state.next_task == 0 {
            state.next_task = FIRST_TASK_ID;
        }
        let id = TaskId::from(state.next_task);
        state.next_task += 1;

        let project = state
            .projects
            .get_mut(project_id)
            .ok_or_else(|| project_not_found(project_id))?;
        project.tasks.push(Task {
            id: id.clone(),
            updated_at: Some(Timestamp::now()),
            ..task.clone()
        });
        Ok(id)
    }

    async fn delete_task(&self, project_id: &ProjectId, task_id: &TaskId) -> GatewayResult<()> {
        let mut state = self.begin(format!("delete_task:{task_id}"))?;
        let project = state
            .projects
            .get_mut(project_id)
            .ok_or_else(|| project_not_found(project_id))?;
        let before = project.tasks.len();
        project.tasks.retain(|t| &t.id != task_id);
        if project.tasks.len() == before {
            return Err(GatewayError::not_found(format!("Task {task_id}")));
        }
        Ok(())
    }
}

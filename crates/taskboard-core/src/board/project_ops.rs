//! Project lifecycle operations for the Board: listing, selection, creation,
//! deletion, generation polling and reconciliation.

use std::collections::HashSet;

use jiff::Timestamp;
use log::{debug, info, warn};

use super::{Board, BoardEvent};
use crate::{
    cache::CacheKey,
    error::{BoardError, Result},
    gateway::GatewayError,
    models::{LifecycleStatus, NewProject, Project, ProjectId, Task},
    store::TaskStore,
};

/// Result of one reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing to reconcile: guest board or a project that is not completed
    Skipped,
    /// A local edit is inside the grace window; try again next cycle
    Deferred,
    /// The remote snapshot was merged into the store
    Merged {
        /// Tasks whose local copy was kept over the remote one
        kept_local: usize,
        /// Whether the store changed
        changed: bool,
    },
}

fn load_error(project_id: &ProjectId, operation: &str, error: GatewayError) -> BoardError {
    if error.is_not_found() {
        BoardError::ProjectNotFound {
            id: project_id.clone(),
        }
    } else {
        BoardError::persistence(operation, error)
    }
}

/// Project metadata without task bodies, as kept in the list and cache.
fn metadata(project: &Project) -> Project {
    Project {
        task_count: Some(project.task_total()),
        tasks: Vec::new(),
        ..project.clone()
    }
}

impl Board {
    /// Refreshes the owner's project list.
    ///
    /// Served from the cache while fresh unless `force` is set. Guest boards
    /// have no remote projects.
    pub async fn refresh_projects(&self, force: bool) -> Result<Vec<Project>> {
        let Some(owner) = self.state().session.owner.clone().filter(|o| !o.trim().is_empty())
        else {
            return Ok(Vec::new());
        };
        let key = CacheKey::projects(owner.clone());

        if !force {
            let lookup = key.clone();
            let cached = self
                .with_cache_quietly("read", move |cache| cache.get::<Vec<Project>>(&lookup))
                .await
                .flatten();
            if let Some(projects) = cached {
                self.state().projects = projects.clone();
                return Ok(projects);
            }
        }

        let projects = self
            .gateway()
            .list_projects(&owner)
            .await
            .map_err(|e| BoardError::persistence("list projects", e))?;
        let projects: Vec<Project> = projects.iter().map(metadata).collect();

        let payload = projects.clone();
        self.with_cache_quietly("write", move |cache| cache.set(&key, &payload))
            .await;

        self.state().projects = projects.clone();
        debug!("Refreshed {} project(s) for {owner}", projects.len());
        self.emit(BoardEvent::ProjectsRefreshed {
            count: projects.len(),
        });
        Ok(projects)
    }

    /// Makes `project_id` the active project and loads its tasks.
    ///
    /// Cached tasks are used while fresh. A project still generating starts
    /// with an empty store; the coordinator polls it to completion. Results
    /// that arrive after another project was selected are dropped.
    pub async fn select_project(&self, project_id: &ProjectId) -> Result<Project> {
        let epoch = {
            let mut state = self.state();
            let known = state.projects.iter().find(|p| &p.id == project_id).cloned();
            state.activate(known)
        };
        info!("Selecting project {project_id}");

        let tasks_key = CacheKey::tasks(project_id);
        let project_key = CacheKey::project(project_id);
        let cached = self
            .with_cache_quietly("read", move |cache| {
                Ok(match cache.get::<Vec<Task>>(&tasks_key)? {
                    Some(tasks) => Some((tasks, cache.get::<Project>(&project_key)?)),
                    None => None,
                })
            })
            .await
            .flatten();

        if let Some((tasks, meta)) = cached {
            let mut state = self.state();
            let project = meta
                .or_else(|| state.active.clone())
                .unwrap_or_else(|| placeholder(project_id));
            if state.epoch != epoch {
                return Ok(metadata(&project));
            }
            state.store.replace_all(tasks);
            state.active = Some(metadata(&project));
            drop(state);
            self.emit(BoardEvent::ProjectSelected {
                project_id: project_id.clone(),
            });
            return Ok(metadata(&project));
        }

        let project = self
            .gateway()
            .get_project(project_id)
            .await
            .map_err(|e| load_error(project_id, "load project", e))?;
        self.adopt_project(project, epoch, true).await
    }

    /// Installs a freshly fetched project if `epoch` is still current.
    async fn adopt_project(&self, project: Project, epoch: u64, announce: bool) -> Result<Project> {
        let project_id = project.id.clone();
        let meta = metadata(&project);
        {
            let mut state = self.state();
            if state.epoch != epoch {
                debug!("Dropping stale load of project {project_id}");
                return Ok(meta);
            }
            if project.lifecycle_status == LifecycleStatus::Completed {
                state.store.replace_all(project.tasks.clone());
            } else {
                state.store.clear();
            }
            state.active = Some(meta.clone());
            match state.projects.iter_mut().find(|p| p.id == project_id) {
                Some(listed) => *listed = meta.clone(),
                None => state.projects.push(meta.clone()),
            }
        }

        if project.lifecycle_status == LifecycleStatus::Completed {
            let tasks_key = CacheKey::tasks(&project_id);
            let project_key = CacheKey::project(&project_id);
            let cached_meta = meta.clone();
            let tasks = project.tasks;
            self.with_cache_quietly("write", move |cache| {
                cache.set(&tasks_key, &tasks)?;
                cache.set(&project_key, &cached_meta)
            })
            .await;
        }

        if announce {
            self.emit(BoardEvent::ProjectSelected {
                project_id: project_id.clone(),
            });
        }
        match meta.lifecycle_status {
            LifecycleStatus::Completed => {}
            LifecycleStatus::Generating => self.emit(BoardEvent::LifecycleChanged {
                project_id: project_id.clone(),
                status: LifecycleStatus::Generating,
            }),
            LifecycleStatus::Failed => self.emit(BoardEvent::GenerationFailed {
                project_id: project_id.clone(),
                reason: meta.error.clone().unwrap_or_default(),
            }),
        }
        Ok(meta)
    }

    /// Opens a project whose tasks exist only locally.
    ///
    /// Used by guest boards; nothing about it is cached or persisted.
    pub fn select_local_project(&self, project: Project) {
        let project_id = project.id.clone();
        {
            let mut state = self.state();
            let tasks = project.tasks.clone();
            state.activate(Some(project));
            state.store.replace_all(tasks);
        }
        self.emit(BoardEvent::ProjectSelected { project_id });
    }

    /// Leaves the active project; pending remote results are ignored.
    pub fn deselect_project(&self) {
        self.state().activate(None);
    }

    /// Registers a new project and selects it.
    ///
    /// The project starts out `generating` unless it already carries tasks.
    pub async fn create_project(&self, mut new_project: NewProject) -> Result<Project> {
        if self.is_guest() {
            return Err(BoardError::validation("userId")
                .with_reason("Guest boards cannot create remote projects"));
        }
        let owner = self.state().session.owner.clone().unwrap_or_default();
        if new_project.owner_id.trim().is_empty() {
            new_project.owner_id = owner.clone();
        }
        new_project.validate()?;

        let project_id = self
            .gateway()
            .create_project(&new_project)
            .await
            .map_err(|e| BoardError::persistence("create project", e))?;
        info!("Created project {project_id}");

        let projects_key = CacheKey::projects(owner);
        self.with_cache_quietly("invalidation", move |cache| cache.invalidate(&projects_key))
            .await;

        let project = Project {
            id: project_id,
            title: new_project.title,
            description: Some(new_project.description),
            owner_id: Some(new_project.owner_id),
            group_id: new_project.group_id,
            lifecycle_status: if new_project.tasks.is_empty() {
                LifecycleStatus::Generating
            } else {
                LifecycleStatus::Completed
            },
            error: None,
            task_count: None,
            tasks: new_project.tasks,
        };
        let epoch = self.state().activate(None);
        self.adopt_project(project, epoch, true).await
    }

    /// Deletes a project remotely, then forgets it locally.
    pub async fn delete_project(&self, project_id: &ProjectId) -> Result<()> {
        if !self.is_guest() {
            self.gateway()
                .delete_project(project_id)
                .await
                .map_err(|e| load_error(project_id, "delete project", e))?;
        }

        {
            let mut state = self.state();
            state.projects.retain(|p| &p.id != project_id);
            if state.active.as_ref().is_some_and(|p| &p.id == project_id) {
                state.activate(None);
            }
        }
        info!("Deleted project {project_id}");

        if !self.is_guest() {
            self.invalidate_project_cache(project_id).await;
        }
        self.emit(BoardEvent::ProjectDeleted {
            project_id: project_id.clone(),
        });
        Ok(())
    }

    /// Polls the generation status of the active project once.
    ///
    /// On `completed` the task list is loaded. On `failed` the project is
    /// marked failed, a [`BoardEvent::GenerationFailed`] is emitted and
    /// `BoardError::GenerationFailed` returned; there is no retry.
    pub async fn poll_generation(&self) -> Result<LifecycleStatus> {
        let (project_id, epoch) = {
            let state = self.state();
            let active = state.active.as_ref().ok_or(BoardError::NoProjectSelected)?;
            if active.lifecycle_status != LifecycleStatus::Generating || state.session.is_guest()
            {
                return Ok(active.lifecycle_status);
            }
            (active.id.clone(), state.epoch)
        };

        let status = self
            .gateway()
            .get_project_status(&project_id)
            .await
            .map_err(|e| load_error(&project_id, "poll generation status", e))?;
        if self.state().epoch != epoch {
            return Ok(status.status);
        }

        match status.status {
            LifecycleStatus::Generating => {
                debug!("Project {project_id} still generating");
                Ok(LifecycleStatus::Generating)
            }
            LifecycleStatus::Completed => {
                let project = self
                    .gateway()
                    .get_project(&project_id)
                    .await
                    .map_err(|e| load_error(&project_id, "load project", e))?;
                let project = Project {
                    lifecycle_status: LifecycleStatus::Completed,
                    ..project
                };
                self.adopt_project(project, epoch, false).await?;
                self.invalidate_projects_list().await;
                info!("Project {project_id} finished generating");
                self.emit(BoardEvent::LifecycleChanged {
                    project_id,
                    status: LifecycleStatus::Completed,
                });
                Ok(LifecycleStatus::Completed)
            }
            LifecycleStatus::Failed => {
                let reason = status
                    .error
                    .unwrap_or_else(|| "Generation failed".to_string());
                self.state()
                    .set_lifecycle(&project_id, LifecycleStatus::Failed, Some(reason.clone()));
                self.invalidate_projects_list().await;
                warn!("Project {project_id} failed to generate: {reason}");
                self.emit(BoardEvent::GenerationFailed {
                    project_id: project_id.clone(),
                    reason: reason.clone(),
                });
                Err(BoardError::GenerationFailed { project_id, reason })
            }
        }
    }

    async fn invalidate_projects_list(&self) {
        let owner = self.state().session.owner.clone();
        if let Some(owner) = owner {
            let key = CacheKey::projects(owner);
            self.with_cache_quietly("invalidation", move |cache| cache.invalidate(&key))
                .await;
        }
    }

    /// Merges the remote snapshot of the active project into the store.
    pub async fn reconcile(&self) -> Result<ReconcileOutcome> {
        self.reconcile_at(Timestamp::now()).await
    }

    /// [`Board::reconcile`] evaluated at `now`.
    ///
    /// Within the grace window of the last local edit nothing is fetched and
    /// the store is left alone. Afterwards each remote task replaces its
    /// local copy unless the local copy was edited after the remote
    /// `updatedAt`. Tasks still waiting for a permanent id are kept.
    pub async fn reconcile_at(&self, now: Timestamp) -> Result<ReconcileOutcome> {
        let grace = self.inner.config.grace_period;
        let (project_id, epoch) = {
            let state = self.state();
            let active = state.active.as_ref().ok_or(BoardError::NoProjectSelected)?;
            if state.session.is_guest() || active.lifecycle_status != LifecycleStatus::Completed {
                return Ok(ReconcileOutcome::Skipped);
            }
            if state.in_grace_window(now, grace) {
                debug!("Deferring reconcile of {}: recent local edit", active.id);
                return Ok(ReconcileOutcome::Deferred);
            }
            (active.id.clone(), state.epoch)
        };

        let remote = self
            .gateway()
            .get_project(&project_id)
            .await
            .map_err(|e| load_error(&project_id, "reconcile", e))?;

        let (kept_local, changed) = {
            let mut state = self.state();
            if state.epoch != epoch {
                return Ok(ReconcileOutcome::Skipped);
            }
            // An edit landed while the snapshot was in flight
            if state.in_grace_window(now, grace) {
                return Ok(ReconcileOutcome::Deferred);
            }

            let remote_ids: HashSet<_> = remote.tasks.iter().map(|t| t.id.clone()).collect();
            let mut merged = Vec::with_capacity(remote.tasks.len());
            let mut kept_local = 0;
            for task in &remote.tasks {
                let local_is_newer = state.local_edits.get(&task.id).is_some_and(|edited| {
                    task.updated_at.is_some_and(|remote_at| *edited > remote_at)
                });
                let local = state.store.get(&task.id).filter(|_| local_is_newer).cloned();
                match local {
                    Some(local) => {
                        merged.push(local);
                        kept_local += 1;
                    }
                    None => {
                        state.local_edits.remove(&task.id);
                        merged.push(task.clone());
                    }
                }
            }
            for local in state.store.all() {
                if local.id.is_temporary() && !remote_ids.contains(&local.id) {
                    merged.push(local.clone());
                    kept_local += 1;
                }
            }

            let next = TaskStore::from_tasks(merged);
            let changed = next != state.store;
            if changed {
                state.store = next;
            }
            (kept_local, changed)
        };
        debug!("Reconciled {project_id}: kept {kept_local} local, changed {changed}");

        let tasks_key = CacheKey::tasks(&project_id);
        let tasks = remote.tasks;
        self.with_cache_quietly("write", move |cache| cache.set(&tasks_key, &tasks))
            .await;

        if changed {
            self.emit(BoardEvent::TasksChanged { project_id });
        }
        Ok(ReconcileOutcome::Merged {
            kept_local,
            changed,
        })
    }
}

fn placeholder(project_id: &ProjectId) -> Project {
    Project {
        id: project_id.clone(),
        title: String::new(),
        description: None,
        owner_id: None,
        group_id: None,
        lifecycle_status: LifecycleStatus::Completed,
        error: None,
        task_count: None,
        tasks: Vec::new(),
    }
}

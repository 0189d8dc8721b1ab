//! Column projection and task mutations for the Board.
//!
//! Every mutation follows the same two phases: [`Board::apply_local`] changes
//! the store synchronously and hands back a [`LocalChange`], then
//! [`Board::persist_remote`] sends the remote calls and either discards the
//! undo token or rolls the store back.

use jiff::Timestamp;
use log::{debug, info, warn};
use tokio::sync::watch;

use super::{Board, BoardEvent, BoardState, CreateState, LocalChange};
use crate::{
    drag::{plan_drag, DragContext, DragOutcome, DragResult},
    error::{BoardError, Result},
    gateway::{GatewayError, GatewayResult},
    models::{BoardFilter, Column, NewTask, ProjectId, Task, TaskId, TaskPatch, ViewMode},
    mutation::{Change, Mutation, RemoteCall},
    projection::project,
};

impl BoardState {
    fn apply(&mut self, mutation: &Mutation, now: Timestamp) -> Result<LocalChange> {
        let project_id = self.active_id()?;
        let undo = mutation.apply(&mut self.store);
        for change in &mutation.changes {
            let id = match change {
                Change::Upsert(task) => &task.id,
                Change::Remove(id) => id,
            };
            self.local_edits.insert(id.clone(), now);
        }
        self.last_local_edit = Some(now);
        if !self.session.is_guest() {
            for call in &mutation.remote {
                if let RemoteCall::Create { task } = call {
                    let (sender, _) = watch::channel(CreateState::Pending);
                    self.pending_creates.insert(task.id.clone(), sender);
                }
            }
        }
        Ok(LocalChange {
            undo,
            project_id,
            epoch: self.epoch,
        })
    }

    /// Permanent id for `id`, if its create call already completed.
    fn resolve(&self, id: &TaskId) -> TaskId {
        self.renamed.get(id).cloned().unwrap_or_else(|| id.clone())
    }
}

impl Board {
    /// Columns for the current view mode and filters.
    pub fn columns(&self) -> Vec<Column> {
        let state = self.state();
        project(state.store.all(), state.effective_view_mode(), &state.filter)
    }

    /// Columns for an explicit view mode and filter.
    pub fn columns_for(&self, mode: ViewMode, filter: &BoardFilter) -> Vec<Column> {
        let state = self.state();
        let mode = if state.session.is_guest() {
            ViewMode::Status
        } else {
            mode
        };
        project(state.store.all(), mode, filter)
    }

    /// Applies `mutation` to the store of the active project.
    ///
    /// The returned [`LocalChange`] must be handed to
    /// [`Board::persist_remote`].
    pub fn apply_local(&self, mutation: &Mutation) -> Result<LocalChange> {
        let change = self.state().apply(mutation, Timestamp::now())?;
        self.emit(BoardEvent::TasksChanged {
            project_id: change.project_id.clone(),
        });
        Ok(change)
    }

    /// Sends the remote calls of `mutation`.
    ///
    /// The project's cache entries are invalidated before the first call and
    /// again once every call succeeded. Calls on a task whose create call is
    /// still in flight wait for it and then target the permanent id. On
    /// success the undo token is discarded; returns the permanent ids of
    /// created tasks.
    /// On the first failed call the local change is rolled back (unless the
    /// active project changed meanwhile), a [`BoardEvent::PersistFailed`] is
    /// emitted and `BoardError::Persistence` is returned. Nothing is retried.
    pub async fn persist_remote(
        &self,
        mutation: Mutation,
        change: LocalChange,
    ) -> Result<Vec<TaskId>> {
        let LocalChange {
            undo,
            project_id,
            epoch,
        } = change;

        if self.is_guest() {
            undo.discard();
            return Ok(Vec::new());
        }
        self.invalidate_project_cache(&project_id).await;

        let mut created = Vec::new();
        for call in &mutation.remote {
            if let Err(e) = self.send(&project_id, call, epoch, &mut created).await {
                warn!(
                    "Rolling back {} on project {project_id}: {e}",
                    mutation.operation
                );
                {
                    let mut guard = self.state();
                    let state = &mut *guard;
                    if state.epoch == epoch {
                        let restored = undo.revert(&mut state.store, &state.renamed);
                        debug!("Restored {restored} task(s)");
                    } else {
                        undo.discard();
                    }
                }
                self.emit(BoardEvent::TasksChanged {
                    project_id: project_id.clone(),
                });
                self.emit(BoardEvent::PersistFailed {
                    operation: mutation.operation.to_string(),
                    message: e.to_string(),
                });
                return Err(BoardError::persistence(mutation.operation, e));
            }
        }

        undo.discard();
        self.invalidate_project_cache(&project_id).await;
        Ok(created)
    }

    async fn send(
        &self,
        project_id: &ProjectId,
        call: &RemoteCall,
        epoch: u64,
        created: &mut Vec<TaskId>,
    ) -> GatewayResult<()> {
        match call {
            RemoteCall::Create { task } => {
                let result = self.gateway().create_task(project_id, task).await;
                let mut state = self.state();
                let id = match result {
                    Ok(id) => id,
                    Err(e) => {
                        state.finish_create(&task.id, CreateState::Failed);
                        return Err(e);
                    }
                };
                if state.epoch == epoch {
                    state.store.rename(&task.id, id.clone());
                    if let Some(edited) = state.local_edits.remove(&task.id) {
                        state.local_edits.insert(id.clone(), edited);
                    }
                    state.renamed.insert(task.id.clone(), id.clone());
                }
                state.finish_create(&task.id, CreateState::Created(id.clone()));
                created.push(id);
            }
            RemoteCall::Patch { id, patch } => {
                if let Some(target) = self.remote_id(id).await? {
                    self.gateway().patch_task(&target, patch).await?;
                }
            }
            RemoteCall::Delete { id } => {
                if let Some(target) = self.remote_id(id).await? {
                    self.gateway().delete_task(project_id, &target).await?;
                }
            }
        }
        Ok(())
    }

    /// Id under which the remote store knows `id`.
    ///
    /// Waits while the task's create call is in flight. `None` means the
    /// task was never sent to the remote store.
    async fn remote_id(&self, id: &TaskId) -> GatewayResult<Option<TaskId>> {
        let (target, pending) = {
            let state = self.state();
            let target = state.resolve(id);
            let pending = state
                .pending_creates
                .get(&target)
                .map(watch::Sender::subscribe);
            (target, pending)
        };
        if !target.is_temporary() {
            return Ok(Some(target));
        }
        let Some(mut pending) = pending else {
            debug!("Skipping remote call for unsaved task {target}");
            return Ok(None);
        };

        debug!("Waiting for task {target} to be created");
        loop {
            let outcome = pending.borrow_and_update().clone();
            match outcome {
                CreateState::Created(id) => return Ok(Some(id)),
                CreateState::Failed => break,
                CreateState::Pending => {
                    if pending.changed().await.is_err() {
                        break;
                    }
                }
            }
        }
        Err(GatewayError::not_found(format!("Task {target}")))
    }

    /// Drops the project's cached task list and metadata, and the owner's
    /// project list.
    pub(crate) async fn invalidate_project_cache(&self, project_id: &ProjectId) {
        let owner = self.state().session.owner.clone();
        let project_id = project_id.clone();
        self.with_cache_quietly("invalidation", move |cache| {
            cache.invalidate_project(owner.as_deref(), &project_id)
        })
        .await;
    }

    /// Commits a drag-and-drop gesture.
    pub async fn on_drag_end(&self, drag: DragResult) -> Result<DragOutcome> {
        let (mutation, change) = {
            let mut state = self.state();
            let ctx = DragContext {
                mode: state.effective_view_mode(),
                filter: &state.filter,
                actor: state.session.actor(),
            };
            let Some(mutation) = plan_drag(&state.store, &drag, ctx)? else {
                return Ok(DragOutcome::Unchanged);
            };
            let change = state.apply(&mutation, Timestamp::now())?;
            (mutation, change)
        };
        self.emit(BoardEvent::TasksChanged {
            project_id: change.project_id.clone(),
        });

        let moved = mutation.changes.iter().find_map(|c| match c {
            Change::Upsert(task) if task.id == drag.task_id => Some(task.clone()),
            _ => None,
        });
        let resequenced = mutation.changes.len().saturating_sub(1);

        self.persist_remote(mutation, change).await?;
        info!("Moved task {} ({resequenced} resequenced)", drag.task_id);

        let id = self.state().resolve(&drag.task_id);
        let task = self
            .task(&id)
            .or(moved)
            .ok_or_else(|| BoardError::TaskNotFound {
                id: drag.task_id.clone(),
            })?;
        Ok(DragOutcome::Moved { task, resequenced })
    }

    /// Edits fields of a task; returns the task as stored.
    pub async fn edit_task(&self, id: &TaskId, patch: TaskPatch) -> Result<Task> {
        let planned = {
            let mut state = self.state();
            match Mutation::edit(&state.store, id, &patch)? {
                Some(mutation) => {
                    let change = state.apply(&mutation, Timestamp::now())?;
                    Some((mutation, change))
                }
                None => None,
            }
        };

        if let Some((mutation, change)) = planned {
            self.emit(BoardEvent::TasksChanged {
                project_id: change.project_id.clone(),
            });
            self.persist_remote(mutation, change).await?;
        }

        let resolved = self.state().resolve(id);
        self.task(&resolved)
            .ok_or_else(|| BoardError::TaskNotFound { id: id.clone() })
    }

    /// Removes a task.
    pub async fn delete_task(&self, id: &TaskId) -> Result<()> {
        let (mutation, change) = {
            let mut state = self.state();
            let mutation = Mutation::delete(&state.store, id)?;
            let change = state.apply(&mutation, Timestamp::now())?;
            (mutation, change)
        };
        self.emit(BoardEvent::TasksChanged {
            project_id: change.project_id.clone(),
        });
        self.persist_remote(mutation, change).await?;
        Ok(())
    }

    /// Adds a task right after `after`, or at the end of the collection.
    ///
    /// The task is visible immediately under a temporary id and is renamed
    /// once the remote store assigns its permanent one.
    pub async fn add_task(&self, new_task: NewTask, after: Option<&TaskId>) -> Result<Task> {
        let temp_id = TaskId::temporary();
        let (mutation, change) = {
            let mut state = self.state();
            let mutation = Mutation::add(&state.store, new_task, after, temp_id.clone())?;
            let change = state.apply(&mutation, Timestamp::now())?;
            (mutation, change)
        };
        self.emit(BoardEvent::TasksChanged {
            project_id: change.project_id.clone(),
        });

        let created = self.persist_remote(mutation, change).await?;
        let id = created.into_iter().next().unwrap_or(temp_id);
        self.task(&id).ok_or(BoardError::TaskNotFound { id })
    }
}

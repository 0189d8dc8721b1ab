//! The board: session context, task store and sync operations in one handle.
//!
//! [`Board`] is what a front end talks to. It owns the task store of the
//! active project, derives columns on demand, applies edits and drags as
//! optimistic mutations, persists them through the [`RemoteGateway`] and
//! merges remote snapshots back in.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   task_ops      │    │   Task store    │    │  RemoteGateway  │
//! │ (drag, edit,    │───▶│ (apply_local,   │───▶│ (persist_remote)│
//! │  add, delete)   │    │  undo tokens)   │    │                 │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//!          ▲                      ▲                       │
//!          │              ┌─────────────────┐             │
//!          └──────────────│  project_ops    │◀────────────┘
//!                         │ (select, poll,  │   snapshots
//!                         │  reconcile)     │
//!                         └─────────────────┘
//! ```
//!
//! ## Submodules
//!
//! - [`builder`]: Factory for [`Board`] instances with cache and gateway setup
//! - [`task_ops`]: Column projection and task mutations
//! - [`project_ops`]: Project lifecycle, generation polling and reconciliation
//!
//! ## Concurrency
//!
//! State sits behind a synchronous mutex that is never held across an
//! `.await`. Local mutations therefore apply atomically and in call order,
//! while network calls run unlocked. Every project switch bumps an epoch;
//! results of remote calls started under an older epoch are discarded.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use taskboard_core::{
//!     gateway::InMemoryGateway,
//!     models::{ProjectId, ViewMode},
//!     BoardBuilder,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let board = BoardBuilder::new()
//!     .with_gateway(Arc::new(InMemoryGateway::new()))
//!     .with_owner("alice")
//!     .build()
//!     .await?;
//!
//! board.refresh_projects(false).await?;
//! board.select_project(&ProjectId::new("42")).await?;
//! board.set_view_mode(ViewMode::UserStatus).await?;
//! for column in board.columns() {
//!     println!("{}: {} tasks", column.title, column.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use jiff::Timestamp;
use log::warn;
use tokio::{
    sync::{broadcast, watch},
    task,
};

use crate::{
    cache::{Cache, CacheTtl},
    error::{BoardError, Result},
    gateway::RemoteGateway,
    models::{
        BoardFilter, BoardStats, LifecycleStatus, Project, ProjectGroups, ProjectId, Task, TaskId,
        ViewMode,
    },
    mutation::UndoToken,
    store::TaskStore,
};

pub mod builder;
pub mod project_ops;
pub mod task_ops;


pub use builder::BoardBuilder;
pub use project_ops::ReconcileOutcome;

/// Preference name under which the chosen view mode is stored.
pub const VIEW_MODE_PREFERENCE: &str = "view_mode";

/// Timing and cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub ttl: CacheTtl,
    /// How long after a local edit remote snapshots are not adopted
    pub grace_period: Duration,
    /// Interval of the background project refresh and reconcile
    pub refresh_interval: Duration,
    /// Interval of generation status polls while a project is generating
    pub generation_poll_interval: Duration,
    /// Buffered events per subscriber
    pub event_capacity: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            ttl: CacheTtl::default(),
            grace_period: Duration::from_secs(10),
            refresh_interval: Duration::from_secs(15),
            generation_poll_interval: Duration::from_secs(3),
            event_capacity: 64,
        }
    }
}

/// Who is using the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Owner whose projects are listed; `None` for guests
    pub owner: Option<String>,
    /// Person performing edits, used as the default assignee on drops
    pub actor: Option<String>,
}

impl Session {
    /// Guest boards are local-only.
    pub fn is_guest(&self) -> bool {
        self.owner.as_deref().map_or(true, |o| o.trim().is_empty())
    }

    /// Acting identity, falling back to the owner.
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref().or(self.owner.as_deref())
    }
}

/// Notifications for observers of the board.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    ProjectsRefreshed { count: usize },
    ProjectSelected { project_id: ProjectId },
    ProjectDeleted { project_id: ProjectId },
    /// The task store of the active project changed
    TasksChanged { project_id: ProjectId },
    LifecycleChanged {
        project_id: ProjectId,
        status: LifecycleStatus,
    },
    GenerationFailed {
        project_id: ProjectId,
        reason: String,
    },
    /// A remote write failed and its local change was rolled back
    PersistFailed { operation: String, message: String },
}

/// Progress of the create call of a task still under its temporary id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CreateState {
    Pending,
    Created(TaskId),
    Failed,
}

/// A mutation applied to the local store and not yet persisted.
#[must_use = "a local change must be passed to persist_remote"]
#[derive(Debug)]
pub struct LocalChange {
    pub(crate) undo: UndoToken,
    pub(crate) project_id: ProjectId,
    pub(crate) epoch: u64,
}

impl LocalChange {
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }
}

#[derive(Debug, Default)]
pub(crate) struct BoardState {
    pub(crate) session: Session,
    pub(crate) view_mode: ViewMode,
    pub(crate) filter: BoardFilter,
    pub(crate) projects: Vec<Project>,
    /// Metadata of the active project; tasks live in `store`
    pub(crate) active: Option<Project>,
    pub(crate) store: TaskStore,
    pub(crate) last_local_edit: Option<Timestamp>,
    pub(crate) local_edits: HashMap<TaskId, Timestamp>,
    /// Temporary ids whose create call completed
    pub(crate) renamed: HashMap<TaskId, TaskId>,
    /// Temporary ids whose create call is in flight
    pub(crate) pending_creates: HashMap<TaskId, watch::Sender<CreateState>>,
    pub(crate) epoch: u64,
}

impl BoardState {
    pub(crate) fn effective_view_mode(&self) -> ViewMode {
        if self.session.is_guest() {
            ViewMode::Status
        } else {
            self.view_mode
        }
    }

    pub(crate) fn active_id(&self) -> Result<ProjectId> {
        self.active
            .as_ref()
            .map(|p| p.id.clone())
            .ok_or(BoardError::NoProjectSelected)
    }

    /// Makes `project` (metadata only) active with an empty store.
    pub(crate) fn activate(&mut self, project: Option<Project>) -> u64 {
        self.epoch += 1;
        self.active = project.map(|mut p| {
            p.tasks.clear();
            p
        });
        self.store.clear();
        self.last_local_edit = None;
        self.local_edits.clear();
        self.renamed.clear();
        self.pending_creates.clear();
        self.epoch
    }

    /// Wakes remote calls queued behind the create call of `temp_id`.
    pub(crate) fn finish_create(&mut self, temp_id: &TaskId, outcome: CreateState) {
        if let Some(sender) = self.pending_creates.remove(temp_id) {
            sender.send_replace(outcome);
        }
    }

    /// Records a lifecycle change on the active project and in the list.
    pub(crate) fn set_lifecycle(
        &mut self,
        project_id: &ProjectId,
        status: LifecycleStatus,
        error: Option<String>,
    ) {
        let targets = self
            .active
            .iter_mut()
            .chain(self.projects.iter_mut())
            .filter(|p| &p.id == project_id);
        for project in targets {
            project.lifecycle_status = status;
            project.error = error.clone();
        }
    }

    /// Whether `now` falls inside the grace window of the last local edit.
    pub(crate) fn in_grace_window(&self, now: Timestamp, grace: Duration) -> bool {
        let grace_ms = i64::try_from(grace.as_millis()).unwrap_or(i64::MAX);
        self.last_local_edit
            .is_some_and(|last| now.as_millisecond() - last.as_millisecond() < grace_ms)
    }
}

pub(crate) struct BoardInner {
    pub(crate) state: Mutex<BoardState>,
    pub(crate) cache: Arc<Mutex<Cache>>,
    pub(crate) gateway: Arc<dyn RemoteGateway>,
    pub(crate) events: broadcast::Sender<BoardEvent>,
    pub(crate) config: BoardConfig,
}

/// Handle to a board. Clones share the same state.
#[derive(Clone)]
pub struct Board {
    pub(crate) inner: Arc<BoardInner>,
}

impl Board {
    pub(crate) fn new(
        cache: Cache,
        gateway: Arc<dyn RemoteGateway>,
        session: Session,
        view_mode: ViewMode,
        config: BoardConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let state = BoardState {
            session,
            view_mode,
            ..Default::default()
        };
        Self {
            inner: Arc::new(BoardInner {
                state: Mutex::new(state),
                cache: Arc::new(Mutex::new(cache)),
                gateway,
                events,
                config,
            }),
        }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, BoardState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn gateway(&self) -> &dyn RemoteGateway {
        self.inner.gateway.as_ref()
    }

    pub(crate) fn emit(&self, event: BoardEvent) {
        // No subscribers is not an error
        let _ = self.inner.events.send(event);
    }

    /// Runs `f` against the cache on the blocking pool.
    pub(crate) async fn with_cache<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Cache) -> Result<T> + Send + 'static,
    {
        let cache = Arc::clone(&self.inner.cache);
        task::spawn_blocking(move || {
            let cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
            f(&cache)
        })
        .await
        .map_err(|e| BoardError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Like [`Board::with_cache`], but a cache failure only logs.
    pub(crate) async fn with_cache_quietly<T, F>(&self, what: &str, f: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(&Cache) -> Result<T> + Send + 'static,
    {
        match self.with_cache(f).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Cache {what} failed: {e}");
                None
            }
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.inner.config
    }

    pub fn session(&self) -> Session {
        self.state().session.clone()
    }

    pub fn is_guest(&self) -> bool {
        self.state().session.is_guest()
    }

    /// Receives every [`BoardEvent`] emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.inner.events.subscribe()
    }

    /// View mode in effect; guest boards always show status columns.
    pub fn view_mode(&self) -> ViewMode {
        self.state().effective_view_mode()
    }

    /// Switches the view mode and remembers it as a preference.
    pub async fn set_view_mode(&self, mode: ViewMode) -> Result<()> {
        self.state().view_mode = mode;
        self.with_cache(move |cache| cache.set_preference(VIEW_MODE_PREFERENCE, mode.as_str()))
            .await
    }

    pub fn filter(&self) -> BoardFilter {
        self.state().filter.clone()
    }

    pub fn set_filter(&self, filter: BoardFilter) {
        self.state().filter = filter;
    }

    /// Resets search, status and assignee filters.
    pub fn clear_filters(&self) {
        self.state().filter.clear();
    }

    /// Known projects, as of the last refresh.
    pub fn projects(&self) -> Vec<Project> {
        self.state().projects.clone()
    }

    pub fn project_groups(&self) -> ProjectGroups {
        ProjectGroups::split(self.projects())
    }

    /// Metadata of the active project.
    pub fn active_project(&self) -> Option<Project> {
        self.state().active.clone()
    }

    /// Snapshot of the task store in collection order.
    pub fn tasks(&self) -> Vec<Task> {
        self.state().store.all().to_vec()
    }

    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.state().store.get(id).cloned()
    }

    /// Per-status totals of the active project.
    pub fn stats(&self) -> BoardStats {
        BoardStats::from_tasks(self.state().store.all())
    }

    /// Distinct assignees of the active project, for the assignee filter.
    pub fn assignees(&self) -> Vec<String> {
        self.state().store.assignees()
    }
}

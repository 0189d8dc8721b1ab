//! Command arguments and their execution against a [`Board`].
//!
//! Argument structs carry the clap attributes and convert into core types
//! (`NewTask`, `TaskPatch`, `BoardFilter`, ...) through `From` impls, so the
//! core crate stays free of CLI concerns. [`Cli`] runs one command and renders
//! the result as markdown.

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use log::{info, warn};
use taskboard_core::{
    display::{BoardColumns, OperationStatus, ProjectList},
    models::{
        BoardFilter, ColumnKey, NewProject, NewTask, Priority, ProjectId, TaskId, TaskPatch,
        TaskStatus, ViewMode,
    },
    Board, BoardEvent, Coordinator, DragOutcome, DragResult,
};
use tokio::sync::broadcast::error::RecvError;

use crate::renderer::TerminalRenderer;

/// Column layout of the board
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    /// One column per status
    Status,
    /// One column per assignee
    User,
    /// One column per assignee and status
    UserStatus,
}

impl From<ViewArg> for ViewMode {
    fn from(val: ViewArg) -> Self {
        match val {
            ViewArg::Status => ViewMode::Status,
            ViewArg::User => ViewMode::User,
            ViewArg::UserStatus => ViewMode::UserStatus,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Todo,
    InProgress,
    Done,
}

impl From<StatusArg> for TaskStatus {
    fn from(val: StatusArg) -> Self {
        match val {
            StatusArg::Todo => TaskStatus::Todo,
            StatusArg::InProgress => TaskStatus::InProgress,
            StatusArg::Done => TaskStatus::Done,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    High,
    Medium,
    Low,
}

impl From<PriorityArg> for Priority {
    fn from(val: PriorityArg) -> Self {
        match val {
            PriorityArg::High => Priority::High,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::Low => Priority::Low,
        }
    }
}

/// List projects
#[derive(Args)]
pub struct ProjectsArgs {
    /// Bypass the cached project list
    #[arg(long)]
    pub refresh: bool,
}

/// Show a project's board
///
/// Filters combine: a task is shown only if it matches the search text, the
/// status and the assignee that were given.
#[derive(Args)]
pub struct BoardArgs {
    #[arg(help = "Identifier of the project to show")]
    pub project: String,
    /// Column layout; remembered for later runs
    #[arg(short, long)]
    pub view: Option<ViewArg>,
    #[arg(
        short,
        long,
        help = "Only show tasks whose title, description or assignee contains this text"
    )]
    pub search: Option<String>,
    #[arg(long, help = "Only show tasks with this status")]
    pub status: Option<StatusArg>,
    #[arg(short, long, help = "Only show tasks assigned to this person")]
    pub assignee: Option<String>,
}

impl From<&BoardArgs> for BoardFilter {
    fn from(val: &BoardArgs) -> Self {
        BoardFilter {
            search: val.search.clone(),
            status: val.status.map(Into::into),
            assignee: val.assignee.clone(),
        }
    }
}

/// Register a new project
#[derive(Args)]
pub struct CreateProjectArgs {
    /// Title of the project
    pub title: String,
    #[arg(short, long, help = "What the project is about; tasks are generated from it")]
    pub description: String,
    #[arg(long, help = "Share the project with this group")]
    pub group: Option<String>,
}

impl From<CreateProjectArgs> for NewProject {
    fn from(val: CreateProjectArgs) -> Self {
        NewProject {
            title: val.title,
            description: val.description,
            group_id: val.group,
            ..Default::default()
        }
    }
}

/// Move a task to another column
///
/// The target column uses the board's column ids: `todo`, `in-progress` or
/// `done` in the status view, an assignee name in the user view, and
/// `<assignee>-<status>` (e.g. `alice-in-progress`) in the user-status view.
#[derive(Args)]
pub struct MoveTaskArgs {
    #[arg(help = "Identifier of the project the task belongs to")]
    pub project: String,
    #[arg(help = "Identifier of the task to move")]
    pub task_id: String,
    #[arg(help = "Column id to drop the task into")]
    pub to: String,
    #[arg(
        short,
        long,
        help = "0-based position within the target column (defaults to the end)"
    )]
    pub index: Option<usize>,
    /// Column layout the target column id refers to
    #[arg(short, long)]
    pub view: Option<ViewArg>,
}

/// Add a task
#[derive(Args)]
pub struct AddTaskArgs {
    #[arg(help = "Identifier of the project to add the task to")]
    pub project: String,
    /// Title of the task
    pub title: String,
    #[arg(short, long, help = "Optional description of the work")]
    pub description: Option<String>,
    #[arg(short, long)]
    pub priority: Option<PriorityArg>,
    #[arg(short, long, help = "Person to assign the task to")]
    pub assignee: Option<String>,
    #[arg(long)]
    pub status: Option<StatusArg>,
    #[arg(long, help = "Due date, e.g. 2025-03-01")]
    pub due: Option<String>,
    #[arg(long, help = "Insert right after this task instead of at the end")]
    pub after: Option<String>,
}

impl From<AddTaskArgs> for NewTask {
    fn from(val: AddTaskArgs) -> Self {
        NewTask {
            description: val.description,
            priority: val.priority.map(Into::into).unwrap_or_default(),
            status: val.status.map(Into::into).unwrap_or_default(),
            assigned_to: val.assignee,
            due_date: val.due,
            ..NewTask::new(val.title)
        }
    }
}

/// Edit a task
#[derive(Args)]
pub struct EditTaskArgs {
    #[arg(help = "Identifier of the project the task belongs to")]
    pub project: String,
    #[arg(help = "Identifier of the task to edit")]
    pub task_id: String,
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(short, long)]
    pub status: Option<StatusArg>,
    #[arg(short, long)]
    pub assignee: Option<String>,
    #[arg(short, long)]
    pub priority: Option<PriorityArg>,
    #[arg(long)]
    pub due: Option<String>,
}

impl From<&EditTaskArgs> for TaskPatch {
    fn from(val: &EditTaskArgs) -> Self {
        TaskPatch {
            title: val.title.clone(),
            description: val.description.clone(),
            status: val.status.map(Into::into),
            assigned_to: val.assignee.clone(),
            priority: val.priority.map(Into::into),
            due_date: val.due.clone(),
            ..Default::default()
        }
    }
}

/// Delete a task
#[derive(Args)]
pub struct DeleteTaskArgs {
    #[arg(help = "Identifier of the project the task belongs to")]
    pub project: String,
    #[arg(help = "Identifier of the task to delete")]
    pub task_id: String,
}

/// Delete a project permanently
#[derive(Args)]
pub struct DeleteProjectArgs {
    #[arg(help = "Identifier of the project to delete")]
    pub project: String,
    /// Confirm the deletion (required to prevent accidental deletion)
    #[arg(long)]
    pub confirm: bool,
}

/// Keep a board on screen
#[derive(Args)]
pub struct WatchArgs {
    #[arg(help = "Identifier of the project to watch")]
    pub project: String,
    #[arg(short, long)]
    pub view: Option<ViewArg>,
}

/// Runs commands against one board.
pub struct Cli {
    board: Board,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(board: Board, renderer: TerminalRenderer) -> Self {
        Self { board, renderer }
    }

    pub async fn list_projects(&self, args: ProjectsArgs) -> Result<()> {
        if self.board.is_guest() {
            warn!("No user given; guest boards have no remote projects");
        }
        let projects = self
            .board
            .refresh_projects(args.refresh)
            .await
            .context("Failed to list projects")?;
        self.renderer.show(ProjectList(projects))
    }

    pub async fn show_board(&self, args: BoardArgs) -> Result<()> {
        self.open(&args.project, args.view).await?;
        self.board.set_filter(BoardFilter::from(&args));
        self.render_board()
    }

    pub async fn create_project(&self, args: CreateProjectArgs) -> Result<()> {
        let project = self
            .board
            .create_project(args.into())
            .await
            .context("Failed to create project")?;
        self.renderer.show(OperationStatus::success(format!(
            "Created project {} ({})",
            project.id, project.lifecycle_status
        )))?;
        self.renderer.show(&project)
    }

    pub async fn move_task(&self, args: MoveTaskArgs) -> Result<()> {
        self.open(&args.project, args.view).await?;
        let mode = self.board.view_mode();
        let task_id = TaskId::from(args.task_id.as_str());
        let task = self
            .board
            .task(&task_id)
            .with_context(|| format!("Task {task_id} not found"))?;
        let source = ColumnKey::for_task(&task, mode)
            .with_context(|| format!("Task {task_id} is not on the {mode} board"))?;
        let destination = ColumnKey::decode(mode, &args.to)?;
        let index = args.index.unwrap_or_else(|| {
            self.board
                .columns()
                .iter()
                .find(|c| c.key == destination)
                .map_or(0, |c| c.len())
        });

        let outcome = self
            .board
            .on_drag_end(DragResult::new(task_id, source, destination, index))
            .await
            .context("Failed to move task")?;
        match outcome {
            DragOutcome::Unchanged => {
                self.renderer.show(OperationStatus::success("Task already in place"))
            }
            DragOutcome::Moved { task, resequenced } => {
                self.renderer.show(OperationStatus::success(format!(
                    "Moved task {} to {} ({resequenced} other task(s) resequenced)",
                    task.id, args.to
                )))?;
                self.renderer.show(&task)
            }
        }
    }

    pub async fn add_task(&self, args: AddTaskArgs) -> Result<()> {
        self.open(&args.project, None).await?;
        let after = args.after.as_deref().map(TaskId::from);
        let task = self
            .board
            .add_task(args.into(), after.as_ref())
            .await
            .context("Failed to add task")?;
        self.renderer
            .show(OperationStatus::success(format!("Added task {}", task.id)))?;
        self.renderer.show(&task)
    }

    pub async fn edit_task(&self, args: EditTaskArgs) -> Result<()> {
        self.open(&args.project, None).await?;
        let patch = TaskPatch::from(&args);
        if patch.is_empty() {
            bail!("Nothing to change: pass at least one field to edit");
        }
        let task = self
            .board
            .edit_task(&TaskId::from(args.task_id.as_str()), patch)
            .await
            .context("Failed to edit task")?;
        self.renderer
            .show(OperationStatus::success(format!("Updated task {}", task.id)))?;
        self.renderer.show(&task)
    }

    pub async fn delete_task(&self, args: DeleteTaskArgs) -> Result<()> {
        self.open(&args.project, None).await?;
        let task_id = TaskId::from(args.task_id.as_str());
        self.board
            .delete_task(&task_id)
            .await
            .context("Failed to delete task")?;
        self.renderer
            .show(OperationStatus::success(format!("Deleted task {task_id}")))
    }

    pub async fn delete_project(&self, args: DeleteProjectArgs) -> Result<()> {
        if !args.confirm {
            bail!(
                "Deleting project {} removes all of its tasks; pass --confirm to proceed",
                args.project
            );
        }
        let project_id = ProjectId::new(args.project);
        self.board
            .delete_project(&project_id)
            .await
            .context("Failed to delete project")?;
        self.renderer
            .show(OperationStatus::success(format!("Deleted project {project_id}")))
    }

    /// Redraws the board on every change until interrupted.
    pub async fn watch(&self, args: WatchArgs) -> Result<()> {
        self.open(&args.project, args.view).await?;
        let mut events = self.board.subscribe();
        let mut coordinator = Coordinator::new(self.board.clone());
        coordinator.start();
        self.redraw()?;

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal.context("Failed to listen for Ctrl-C")?;
                    break;
                }
                event = events.recv() => match event {
                    Ok(BoardEvent::GenerationFailed { project_id, reason }) => {
                        self.renderer.show(OperationStatus::failure(format!(
                            "Generation of {project_id} failed: {reason}"
                        )))?;
                    }
                    Ok(BoardEvent::PersistFailed { operation, message }) => {
                        self.renderer.show(OperationStatus::failure(format!(
                            "Could not save {operation}: {message}"
                        )))?;
                    }
                    Ok(BoardEvent::ProjectsRefreshed { .. }) => {}
                    Ok(_) | Err(RecvError::Lagged(_)) => self.redraw()?,
                    Err(RecvError::Closed) => break,
                },
            }
        }

        coordinator.stop().await;
        info!("Stopped watching {}", args.project);
        Ok(())
    }

    /// Selects `project`, switching the view mode first when one is given.
    async fn open(&self, project: &str, view: Option<ViewArg>) -> Result<()> {
        if let Some(view) = view {
            self.board
                .set_view_mode(view.into())
                .await
                .context("Failed to store view mode")?;
        }
        self.board
            .select_project(&ProjectId::new(project))
            .await
            .with_context(|| format!("Failed to open project {project}"))?;
        if self.board.is_guest() {
            warn!("No user given; changes are not saved remotely");
        }
        Ok(())
    }

    fn render_board(&self) -> Result<()> {
        if let Some(project) = self.board.active_project() {
            self.renderer.render(&format!("# {}\n\n", project.title))?;
        }
        self.renderer.show(self.board.stats())?;
        self.renderer.render("\n")?;
        self.renderer.show(BoardColumns(self.board.columns()))
    }

    fn redraw(&self) -> Result<()> {
        self.renderer.clear();
        self.render_board()
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{
    AddTaskArgs, BoardArgs, CreateProjectArgs, DeleteProjectArgs, DeleteTaskArgs, EditTaskArgs,
    MoveTaskArgs, ProjectsArgs, WatchArgs,
};

/// Terminal front end for taskboard
///
/// Shows a project's tasks as kanban columns (by status, by assignee, or
/// both), moves and edits tasks with optimistic local updates, and keeps the
/// view in sync with the remote task API.
#[derive(Parser)]
#[command(version, about, name = "tb")]
pub struct Args {
    /// Path to the SQLite cache file. Defaults to
    /// $XDG_CACHE_HOME/taskboard/cache.db
    #[arg(long, global = true)]
    pub cache_file: Option<PathBuf>,

    /// Base URL of the task API
    #[arg(
        long,
        global = true,
        env = "TASKBOARD_API_URL",
        default_value = "http://localhost:5000"
    )]
    pub api_url: String,

    /// User whose projects are shown. Without one the board runs as a guest
    #[arg(long, global = true, env = "TASKBOARD_USER")]
    pub user: Option<String>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the taskboard CLI
#[derive(Subcommand)]
pub enum Commands {
    /// List projects
    #[command(aliases = ["p", "ls"])]
    Projects(ProjectsArgs),
    /// Show a project's board
    #[command(alias = "b")]
    Board(BoardArgs),
    /// Register a new project and wait for its tasks to be generated
    #[command(alias = "new")]
    Create(CreateProjectArgs),
    /// Move a task to another column
    #[command(alias = "mv")]
    Move(MoveTaskArgs),
    /// Add a task
    #[command(alias = "a")]
    Add(AddTaskArgs),
    /// Edit a task
    #[command(alias = "e")]
    Edit(EditTaskArgs),
    /// Delete a task
    #[command(alias = "rm")]
    Delete(DeleteTaskArgs),
    /// Delete a project permanently
    DeleteProject(DeleteProjectArgs),
    /// Keep a board on screen, refreshing it as the remote copy changes
    #[command(alias = "w")]
    Watch(WatchArgs),
}

//! Core library for the taskboard sync engine.
//!
//! This crate owns the task collection of the active project on a kanban
//! board, derives status/assignee columns from it, applies drags and edits
//! as optimistic local mutations, persists them through a remote gateway and
//! reconciles the store against periodically polled remote snapshots.
//!
//! # Layers
//!
//! - **Models** ([`models`]): tasks, projects, column keys and filters, with
//!   lenient normalization of remote payloads
//! - **Store** ([`store`]): ordered in-memory task collection
//! - **Projection** ([`projection`]): pure `tasks × view mode × filter →
//!   columns`
//! - **Mutations** ([`mutation`], [`drag`]): planned changes plus undo tokens
//! - **Cache** ([`cache`]): TTL cache of remote reads in a local SQLite file
//! - **Gateway** ([`gateway`]): the remote project/task API seam
//! - **Board** ([`board`]): session context tying everything together
//! - **Coordinator** ([`coordinator`]): background refresh and generation
//!   polling
//! - **Display** ([`display`]): markdown formatting for terminal output
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use taskboard_core::{
//!     display::BoardColumns,
//!     gateway::InMemoryGateway,
//!     models::{NewProject, NewTask, Task},
//!     BoardBuilder,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let board = BoardBuilder::new()
//!     .with_in_memory_cache()
//!     .with_gateway(Arc::new(InMemoryGateway::new()))
//!     .with_owner("alice")
//!     .build()
//!     .await?;
//!
//! board
//!     .create_project(NewProject {
//!         title: "Website".to_string(),
//!         description: "Marketing site".to_string(),
//!         tasks: vec![Task::new(1, "Design landing page")],
//!         ..Default::default()
//!     })
//!     .await?;
//! board.add_task(NewTask::new("Write copy"), None).await?;
//!
//! println!("{}", BoardColumns(board.columns()));
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod cache;
pub mod coordinator;
pub mod display;
pub mod drag;
pub mod error;
pub mod gateway;
pub mod models;
pub mod mutation;
pub mod projection;
pub mod store;

// Re-export commonly used types
pub use board::{Board, BoardBuilder, BoardConfig, BoardEvent, ReconcileOutcome, Session};
pub use cache::{Cache, CacheKey, CacheTtl};
pub use coordinator::Coordinator;
pub use display::{BoardColumns, OperationStatus, ProjectList};
pub use drag::{DragOutcome, DragResult};
pub use error::{BoardError, Result};
pub use gateway::{GatewayError, RemoteGateway};
pub use models::{
    BoardFilter, BoardStats, Column, ColumnKey, LifecycleStatus, NewProject, NewTask, Priority,
    Project, ProjectId, Task, TaskId, TaskPatch, TaskStatus, ViewMode,
};
pub use mutation::{Mutation, UndoToken};
pub use store::TaskStore;

//! Markdown display for board data.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! collections and operation feedback go through newtype wrappers. Every
//! formatter produces markdown, which the CLI renders with termimad.
//!
//! ## Module Organization
//!
//! - [`collections`]: Collection wrappers ([`BoardColumns`], [`ProjectList`])
//! - [`status`]: Operation feedback ([`OperationStatus`])
//! - [`models`]: Display implementations for domain models
//!
//! ## Usage Examples
//!
//! ```rust
//! use taskboard_core::{
//!     display::BoardColumns,
//!     models::{BoardFilter, Task, TaskStatus, ViewMode},
//!     projection::project,
//! };
//!
//! let mut task = Task::new(1, "Login form");
//! task.status = TaskStatus::InProgress;
//! let columns = project(&[task], ViewMode::Status, &BoardFilter::default());
//!
//! let output = BoardColumns(columns).to_string();
//! assert!(output.contains("## In Progress (1)"));
//! assert!(output.contains("Login form"));
//! ```

pub mod collections;
pub mod models;
pub mod status;

pub use collections::{BoardColumns, ProjectList};
pub use status::OperationStatus;

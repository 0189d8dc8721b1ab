//! Error types for the board engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{ProjectId, TaskId};

/// Comprehensive error type for all board operations.
#[derive(Error, Debug)]
pub enum BoardError {
    /// Input rejected before any mutation was applied
    #[error("Invalid input for field '{field}': {reason}")]
    Validation { field: String, reason: String },
    /// A remote call failed; the optimistic local change was rolled back
    #[error("Failed to persist {operation}: {message}")]
    Persistence { operation: String, message: String },
    /// Project generation ended in the `failed` lifecycle state
    #[error("Generation failed for project {project_id}: {reason}")]
    GenerationFailed { project_id: ProjectId, reason: String },
    /// Task not present in the store
    #[error("Task with ID {id} not found")]
    TaskNotFound { id: TaskId },
    /// Project unknown to the board or the remote store
    #[error("Project with ID {id} not found")]
    ProjectNotFound { id: ProjectId },
    /// Operation needs an active project
    #[error("No project selected")]
    NoProjectSelected,
    /// Column key does not decode under the active view mode
    #[error("Invalid column key '{key}': {reason}")]
    InvalidColumnKey { key: String, reason: String },
    /// Local cache store errors
    #[error("Cache error: {message}")]
    Cache {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating cache errors with optional context.
pub struct CacheErrorBuilder {
    message: String,
}

impl CacheErrorBuilder {
    /// Create a new cache error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> BoardError {
        BoardError::Cache {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct ValidationBuilder {
    field: String,
}

impl ValidationBuilder {
    /// Create a new validation error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> BoardError {
        BoardError::Validation {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl BoardError {
    /// Creates a builder for cache errors.
    pub fn cache(message: impl Into<String>) -> CacheErrorBuilder {
        CacheErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn validation(field: impl Into<String>) -> ValidationBuilder {
        ValidationBuilder::new(field)
    }

    /// Creates a persistence error for the named remote operation.
    pub fn persistence(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Persistence {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Whether the error was raised before any state was touched.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::InvalidColumnKey { .. })
    }
}

/// Specialized extension trait for cache-store Results.
pub trait CacheResultExt<T> {
    /// Map SQLite errors with a message.
    fn cache_context(self, message: &str) -> Result<T>;
}

impl<T> CacheResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn cache_context(self, message: &str) -> Result<T> {
        self.map_err(|e| BoardError::cache(message).with_source(e))
    }
}

/// Result type alias for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

//! Filter criteria applied when projecting columns.

use serde::{Deserialize, Serialize};

use super::{Task, TaskStatus};

/// Conjunctive filter over the task set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardFilter {
    /// Case-insensitive substring over title, description and assignee
    pub search: Option<String>,

    /// Exact status match
    pub status: Option<TaskStatus>,

    /// Exact assignee match
    pub assignee: Option<String>,
}

impl BoardFilter {
    /// Filter for a free-text search only.
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            search: Some(query.into()),
            ..Default::default()
        }
    }

    /// Whether no criterion is active.
    pub fn is_empty(&self) -> bool {
        self.search_query().is_none() && self.status.is_none() && self.assignee.is_none()
    }

    /// Trimmed, lowercased search query; blank queries count as absent.
    fn search_query(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    /// Applies search, then status, then assignee.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(query) = self.search_query() {
            let hit = task.title.to_lowercase().contains(&query)
                || task
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&query))
                || task.assigned_to.to_lowercase().contains(&query);
            if !hit {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self
            .assignee
            .as_deref()
            .is_some_and(|a| a != task.assigned_to)
        {
            return false;
        }
        true
    }

    /// Drops every criterion.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

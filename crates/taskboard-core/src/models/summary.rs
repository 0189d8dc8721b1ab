//! Aggregate views over the task store and project list.

use serde::Serialize;

use super::{Project, Task, TaskStatus};

/// Per-status task counts for the active project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoardStats {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl BoardStats {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut stats, task| {
            stats.total += 1;
            match task.status {
                TaskStatus::Todo => stats.todo += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Done => stats.done += 1,
            }
            stats
        })
    }

    /// Share of finished tasks, rounded to a whole percent.
    pub fn done_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.done as f64 / self.total as f64) * 100.0).round() as u8
    }
}

/// Project list split by ownership.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectGroups {
    pub individual: Vec<Project>,
    pub group: Vec<Project>,
}

impl ProjectGroups {
    pub fn split(projects: impl IntoIterator<Item = Project>) -> Self {
        let (group, individual) = projects.into_iter().partition(Project::is_group);
        Self { individual, group }
    }

    pub fn is_empty(&self) -> bool {
        self.individual.is_empty() && self.group.is_empty()
    }
}

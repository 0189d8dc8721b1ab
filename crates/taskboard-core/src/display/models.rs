//! Display implementations for domain models.

use std::fmt;

use crate::models::{
    BoardStats, Column, LifecycleStatus, Priority, Project, Task, TaskStatus, ViewMode,
};

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TaskStatus {
    /// Checkbox-style marker used in task lines.
    pub fn marker(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "[ ]",
            TaskStatus::InProgress => "[~]",
            TaskStatus::Done => "[x]",
        }
    }
}

impl fmt::Display for Task {
    /// One list item: marker, id, title, then assignee and priority.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "- {} **{}** {} _({}, {})_",
            self.status.marker(),
            self.id,
            self.title,
            self.assigned_to,
            self.priority
        )?;
        if let Some(due) = self.due_date.as_deref().filter(|d| !d.is_empty()) {
            write!(f, " due {due}")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## {} ({})", self.title, self.tasks.len())?;
        writeln!(f)?;
        if self.tasks.is_empty() {
            writeln!(f, "_No tasks_")?;
        }
        for task in &self.tasks {
            write!(f, "{task}")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = if self.title.is_empty() {
            "Untitled project"
        } else {
            &self.title
        };
        writeln!(f, "### {title} (ID: {})", self.id)?;
        writeln!(f)?;
        writeln!(f, "- **Status**: {}", self.lifecycle_status)?;
        writeln!(f, "- **Tasks**: {}", self.task_total())?;
        if let Some(error) = &self.error {
            writeln!(f, "- **Error**: {error}")?;
        }
        if let Some(desc) = self.description.as_deref().filter(|d| !d.is_empty()) {
            writeln!(f, "- **Description**: {desc}")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for BoardStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "**{}** tasks: {} to do, {} in progress, {} done ({}% complete)",
            self.total,
            self.todo,
            self.in_progress,
            self.done,
            self.done_percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{BoardStats, Column, ColumnKey, Project, Task, TaskStatus};

    #[test]
    fn test_task_line_shows_marker_and_assignee() {
        let mut task = Task::new(7, "Wire up login");
        task.status = TaskStatus::Done;
        task.assigned_to = "alice".to_string();
        assert_eq!(
            task.to_string(),
            "- [x] **7** Wire up login _(alice, Medium)_\n"
        );
    }

    #[test]
    fn test_empty_column_says_so() {
        let column = Column::new(ColumnKey::status(TaskStatus::Todo));
        let output = column.to_string();
        assert!(output.starts_with("## To Do (0)"));
        assert!(output.contains("_No tasks_"));
    }

    #[test]
    fn test_failed_project_shows_error() {
        let project: Project = serde_json::from_str(
            r#"{"id": "p1", "title": "Site", "status": "failed", "error": "model timeout"}"#,
        )
        .unwrap();
        let output = project.to_string();
        assert!(output.contains("- **Status**: failed"));
        assert!(output.contains("- **Error**: model timeout"));
    }

    #[test]
    fn test_stats_line() {
        let stats = BoardStats {
            total: 4,
            todo: 1,
            in_progress: 1,
            done: 2,
        };
        assert!(stats.to_string().contains("(50% complete)"));
    }
}

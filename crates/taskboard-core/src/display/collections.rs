//! Collection wrapper types for displaying groups of domain objects.

use std::fmt;

use crate::models::{Column, Project, ProjectGroups};

/// Newtype wrapper for displaying a whole board, column by column.
pub struct BoardColumns(pub Vec<Column>);

impl BoardColumns {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of tasks across every column.
    pub fn task_count(&self) -> usize {
        self.0.iter().map(Column::len).sum()
    }
}

impl fmt::Display for BoardColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No columns to show.");
        }
        for column in &self.0 {
            write!(f, "{column}")?;
        }
        Ok(())
    }
}

/// Newtype wrapper for a project listing, split into individual and group
/// projects.
pub struct ProjectList(pub Vec<Project>);

impl fmt::Display for ProjectList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = ProjectGroups::split(self.0.iter().cloned());
        if groups.is_empty() {
            return writeln!(f, "No projects found.");
        }
        for (heading, projects) in [
            ("Individual Projects", &groups.individual),
            ("Group Projects", &groups.group),
        ] {
            if projects.is_empty() {
                continue;
            }
            writeln!(f, "## {heading}")?;
            writeln!(f)?;
            for project in projects {
                write!(f, "{project}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoardFilter, Task, ViewMode};
    use crate::projection::project;

    #[test]
    fn test_board_lists_every_column() {
        let columns = project(
            &[Task::new(1, "One"), Task::new(2, "Two")],
            ViewMode::Status,
            &BoardFilter::default(),
        );
        let board = BoardColumns(columns);
        assert_eq!(board.task_count(), 2);
        let output = board.to_string();
        assert!(output.contains("## To Do (2)"));
        assert!(output.contains("## Done (0)"));
    }

    #[test]
    fn test_projects_grouped_by_ownership() {
        let projects: Vec<Project> = serde_json::from_str(
            r#"[{"id": "p1", "title": "Mine"}, {"id": "p2", "title": "Team", "groupId": "g1"}]"#,
        )
        .unwrap();
        let output = ProjectList(projects).to_string();
        let individual = output.find("## Individual Projects").unwrap();
        let group = output.find("## Group Projects").unwrap();
        assert!(individual < group);
        assert!(ProjectList(Vec::new()).to_string().contains("No projects found."));
    }
}

//! View projection: task snapshot + view mode + filters → ordered columns.
//!
//! Columns are recomputed on every call and never stored. Output depends only
//! on the set of input tasks, not on the order they are passed in: tasks are
//! sorted by [`Task::board_order`] and assignee columns are emitted in
//! lexical order.

use std::collections::{BTreeSet, HashMap};

use crate::models::{BoardFilter, Column, ColumnKey, Task, TaskStatus, ViewMode};

/// Derives the board columns for `mode`.
///
/// Status columns are always present. Assignee columns exist for every
/// person assigned at least one task (before search/status filtering, so a
/// search does not make columns disappear); an assignee filter narrows the
/// columns to that person.
pub fn project(tasks: &[Task], mode: ViewMode, filter: &BoardFilter) -> Vec<Column> {
    let mut columns: Vec<Column> = column_keys(tasks, mode, filter)
        .into_iter()
        .map(Column::new)
        .collect();
    let index: HashMap<ColumnKey, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| (column.key.clone(), i))
        .collect();

    let mut ordered: Vec<&Task> = tasks.iter().filter(|t| filter.matches(t)).collect();
    ordered.sort_by(|a, b| a.board_order(b));

    for task in ordered {
        let Some(key) = ColumnKey::for_task(task, mode) else {
            continue;
        };
        if let Some(&i) = index.get(&key) {
            columns[i].tasks.push(task.clone());
        }
    }

    columns
}

/// Tasks of the single column `key`, in projected order.
pub fn column_tasks(tasks: &[Task], key: &ColumnKey, filter: &BoardFilter) -> Vec<Task> {
    let mut selected: Vec<Task> = tasks
        .iter()
        .filter(|t| filter.matches(t) && key.contains(t))
        .filter(|t| key.view_mode() == ViewMode::Status || t.has_person_assignee())
        .cloned()
        .collect();
    selected.sort_by(|a, b| a.board_order(b));
    selected
}

fn column_keys(tasks: &[Task], mode: ViewMode, filter: &BoardFilter) -> Vec<ColumnKey> {
    if mode == ViewMode::Status {
        return TaskStatus::ALL.into_iter().map(ColumnKey::status).collect();
    }

    let assignees: BTreeSet<&str> = tasks
        .iter()
        .filter(|t| t.has_person_assignee())
        .map(|t| t.assigned_to.as_str())
        .filter(|a| filter.assignee.as_deref().map_or(true, |wanted| wanted == *a))
        .collect();

    match mode {
        ViewMode::User => assignees.into_iter().map(ColumnKey::assignee).collect(),
        _ => assignees
            .into_iter()
            .flat_map(|assignee| {
                TaskStatus::ALL
                    .into_iter()
                    .map(move |status| ColumnKey::assignee_status(assignee, status))
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, TaskId, UNASSIGNED};

    fn task(id: u64, seq: Option<i64>, status: TaskStatus, assignee: &str) -> Task {
        let mut task = Task::new(id, format!("Task {id}"));
        task.sequence = seq;
        task.status = status;
        task.assigned_to = assignee.to_string();
        task
    }

    fn sample() -> Vec<Task> {
        vec![
            task(1, Some(3), TaskStatus::Todo, "alice"),
            task(2, Some(1), TaskStatus::InProgress, "bob"),
            task(3, Some(2), TaskStatus::Todo, "alice"),
            task(4, None, TaskStatus::Done, UNASSIGNED),
            task(5, Some(4), TaskStatus::Todo, "in-progress"),
        ]
    }

    fn ids(column: &Column) -> Vec<String> {
        column.tasks.iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn test_status_mode_has_three_fixed_columns() {
        let columns = project(&sample(), ViewMode::Status, &BoardFilter::default());
        let keys: Vec<_> = columns.iter().map(|c| c.key.encode()).collect();
        assert_eq!(keys, vec!["todo", "in-progress", "done"]);
        assert_eq!(ids(&columns[0]), vec!["3", "1", "5"]);
        assert_eq!(ids(&columns[2]), vec!["4"]);
        assert!(project(&[], ViewMode::Status, &BoardFilter::default())
            .iter()
            .all(Column::is_empty));
    }

    #[test]
    fn test_user_modes_partition_tasks_without_sentinel_assignees() {
        for mode in [ViewMode::User, ViewMode::UserStatus] {
            let columns = project(&sample(), mode, &BoardFilter::default());
            let mut seen: Vec<String> = columns.iter().flat_map(ids).collect();
            seen.sort();
            assert_eq!(seen, vec!["1", "2", "3", "4"], "mode {mode:?}");
            assert!(columns
                .iter()
                .all(|c| c.key.target_assignee() != Some("in-progress")));
        }
    }

    #[test]
    fn test_user_status_mode_emits_three_columns_per_assignee() {
        let columns = project(&sample(), ViewMode::UserStatus, &BoardFilter::default());
        let keys: Vec<_> = columns.iter().map(|c| c.key.encode()).collect();
        assert_eq!(
            keys,
            vec![
                "Unassigned-todo",
                "Unassigned-in-progress",
                "Unassigned-done",
                "alice-todo",
                "alice-in-progress",
                "alice-done",
                "bob-todo",
                "bob-in-progress",
                "bob-done",
            ]
        );
    }

    #[test]
    fn test_output_is_independent_of_input_order() {
        let forward = sample();
        let mut reversed = sample();
        reversed.reverse();
        for mode in [ViewMode::Status, ViewMode::User, ViewMode::UserStatus] {
            assert_eq!(
                project(&forward, mode, &BoardFilter::default()),
                project(&reversed, mode, &BoardFilter::default())
            );
        }
    }

    #[test]
    fn test_unsequenced_ties_break_by_id_then_priority() {
        let mut a = task(9, None, TaskStatus::Todo, "alice");
        a.priority = Priority::Low;
        let b = task(8, None, TaskStatus::Todo, "alice");
        let c = task(10, Some(50), TaskStatus::Todo, "alice");
        let columns = project(&[a, b, c], ViewMode::Status, &BoardFilter::default());
        assert_eq!(ids(&columns[0]), vec!["10", "8", "9"]);
    }

    #[test]
    fn test_search_spans_all_columns() {
        let mut tasks = sample();
        tasks[0].title = "Login page".to_string();
        tasks[1].description = Some("Handle LOGIN errors".to_string());
        let columns = project(&tasks, ViewMode::Status, &BoardFilter::search("login"));
        let found: Vec<String> = columns.iter().flat_map(ids).collect();
        assert_eq!(found, vec!["1", "2"]);
    }

    #[test]
    fn test_assignee_filter_narrows_columns() {
        let filter = BoardFilter {
            assignee: Some("bob".to_string()),
            ..Default::default()
        };
        let columns = project(&sample(), ViewMode::User, &filter);
        assert_eq!(columns.len(), 1);
        assert_eq!(ids(&columns[0]), vec!["2"]);
    }

    #[test]
    fn test_column_tasks_matches_projection() {
        let tasks = sample();
        let key = ColumnKey::assignee_status("alice", TaskStatus::Todo);
        let columns = project(&tasks, ViewMode::UserStatus, &BoardFilter::default());
        let projected = columns.iter().find(|c| c.key == key).unwrap();
        assert_eq!(column_tasks(&tasks, &key, &BoardFilter::default()), projected.tasks);
        assert_eq!(projected.position_of(&TaskId::from(1)), Some(1));
    }
}

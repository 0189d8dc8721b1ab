//! In-memory task collection for the active project.
//!
//! The store keeps its tasks sorted by [`Task::board_order`] at all times, so
//! the position of a task in [`TaskStore::all`] is its position in the whole
//! collection. Every mutation is synchronous and visible to the next read.

use std::collections::BTreeSet;

use crate::models::{Task, TaskId};

/// Ordered, normalized task collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from untrusted tasks.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut store = Self::new();
        store.replace_all(tasks);
        store
    }

    /// Every task in collection order.
    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Index of the task in collection order.
    pub fn position_of(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    /// Inserts or replaces the task with the same id; returns the previous
    /// value.
    pub fn upsert(&mut self, mut task: Task) -> Option<Task> {
        task.normalize();
        let previous = self
            .position_of(&task.id)
            .map(|index| self.tasks.remove(index));
        let index = self
            .tasks
            .partition_point(|existing| existing.board_order(&task).is_lt());
        self.tasks.insert(index, task);
        previous
    }

    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        self.position_of(id).map(|index| self.tasks.remove(index))
    }

    /// Swaps in a whole new collection, re-normalizing every task.
    ///
    /// Later duplicates of an id replace earlier ones.
    pub fn replace_all(&mut self, tasks: impl IntoIterator<Item = Task>) {
        self.tasks.clear();
        for task in tasks {
            self.upsert(task);
        }
    }

    /// Renames a task, keeping all of its fields.
    pub fn rename(&mut self, from: &TaskId, to: TaskId) -> bool {
        match self.remove(from) {
            Some(mut task) => {
                task.id = to;
                self.upsert(task);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Highest sequence in use.
    pub fn max_sequence(&self) -> Option<i64> {
        self.tasks.iter().filter_map(|t| t.sequence).max()
    }

    /// Distinct assignees, excluding values that are really statuses.
    pub fn assignees(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| t.has_person_assignee())
            .map(|t| t.assigned_to.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskStatus, UNASSIGNED};

    fn task(id: u64, sequence: Option<i64>) -> Task {
        let mut task = Task::new(id, format!("Task {id}"));
        task.sequence = sequence;
        task
    }

    #[test]
    fn test_keeps_collection_order_regardless_of_insert_order() {
        let mut store = TaskStore::new();
        store.upsert(task(3, Some(30)));
        store.upsert(task(1, None));
        store.upsert(task(2, Some(10)));

        let ids: Vec<_> = store.all().iter().map(|t| t.id.to_string()).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
    }

    #[test]
    fn test_upsert_replaces_and_returns_previous() {
        let mut store = TaskStore::from_tasks(vec![task(1, Some(1))]);
        let mut updated = task(1, Some(5));
        updated.title = "Changed".to_string();

        let previous = store.upsert(updated).expect("task existed");
        assert_eq!(previous.title, "Task 1");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&TaskId::from(1)).unwrap().title, "Changed");
    }

    #[test]
    fn test_replace_all_normalizes() {
        let mut raw = task(1, Some(1));
        raw.assigned_to = String::new();
        raw.status = TaskStatus::normalize("progress");

        let store = TaskStore::from_tasks(vec![raw]);
        let stored = &store.all()[0];
        assert_eq!(stored.assigned_to, UNASSIGNED);
        assert_eq!(stored.status, TaskStatus::InProgress);
    }

    #[test]
    fn test_rename_keeps_position_and_fields() {
        let mut store = TaskStore::from_tasks(vec![task(1, Some(1)), task(2, Some(2))]);
        assert!(store.rename(&TaskId::from(2), TaskId::from("remote-2")));
        assert_eq!(store.position_of(&TaskId::from("remote-2")), Some(1));
        assert!(!store.rename(&TaskId::from(9), TaskId::from(10)));
    }

    #[test]
    fn test_assignees_are_distinct_and_exclude_sentinels() {
        let mut a = task(1, Some(1));
        a.assigned_to = "bob".to_string();
        let mut b = task(2, Some(2));
        b.assigned_to = "alice".to_string();
        let mut c = task(3, Some(3));
        c.assigned_to = "done".to_string();
        let mut d = task(4, Some(4));
        d.assigned_to = "bob".to_string();

        let store = TaskStore::from_tasks(vec![a, b, c, d]);
        assert_eq!(store.assignees(), vec!["alice", "bob"]);
        assert_eq!(store.max_sequence(), Some(4));
    }
}

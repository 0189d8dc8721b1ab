//! Optimistic mutations and their undo tokens.
//!
//! Every local change is expressed as a [`Mutation`]: the task upserts and
//! removals to apply to the store right away, plus the [`RemoteCall`]s that
//! make it durable. Applying a mutation yields an [`UndoToken`] that restores
//! the affected tasks if persistence fails.

use std::collections::HashMap;

use log::debug;

use crate::{
    error::{BoardError, Result},
    models::{NewTask, Task, TaskId, TaskPatch},
    store::TaskStore,
};

/// A single change to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Upsert(Task),
    Remove(TaskId),
}

impl Change {
    fn id(&self) -> &TaskId {
        match self {
            Change::Upsert(task) => &task.id,
            Change::Remove(id) => id,
        }
    }
}

/// A call against the remote gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Patch { id: TaskId, patch: TaskPatch },
    Create { task: Task },
    Delete { id: TaskId },
}

impl RemoteCall {
    /// Id of the task the call targets.
    pub fn task_id(&self) -> &TaskId {
        match self {
            RemoteCall::Patch { id, .. } | RemoteCall::Delete { id } => id,
            RemoteCall::Create { task } => &task.id,
        }
    }
}

/// Local change plus the remote calls that persist it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    /// Operation name used in logs and error messages
    pub operation: &'static str,
    pub changes: Vec<Change>,
    pub remote: Vec<RemoteCall>,
}

impl Mutation {
    /// Applies every change to `store` and records what it replaced.
    pub fn apply(&self, store: &mut TaskStore) -> UndoToken {
        let entries = self
            .changes
            .iter()
            .map(|change| {
                let before = store.get(change.id()).cloned();
                match change {
                    Change::Upsert(task) => {
                        store.upsert(task.clone());
                    }
                    Change::Remove(id) => {
                        store.remove(id);
                    }
                }
                UndoEntry {
                    id: change.id().clone(),
                    before,
                    after: store.get(change.id()).cloned(),
                }
            })
            .collect();
        UndoToken { entries }
    }

    /// Field edit of one task.
    pub fn edit(store: &TaskStore, id: &TaskId, patch: &TaskPatch) -> Result<Option<Self>> {
        patch.validate()?;
        let current = store
            .get(id)
            .ok_or_else(|| BoardError::TaskNotFound { id: id.clone() })?;
        let mut updated = current.clone();
        patch.apply_to(&mut updated);

        let diff = TaskPatch::diff(current, &updated);
        if diff.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            operation: "edit task",
            changes: vec![Change::Upsert(updated)],
            remote: vec![RemoteCall::Patch {
                id: id.clone(),
                patch: diff,
            }],
        }))
    }

    /// Removal of one task.
    pub fn delete(store: &TaskStore, id: &TaskId) -> Result<Self> {
        if store.get(id).is_none() {
            return Err(BoardError::TaskNotFound { id: id.clone() });
        }
        Ok(Self {
            operation: "delete task",
            changes: vec![Change::Remove(id.clone())],
            remote: vec![RemoteCall::Delete { id: id.clone() }],
        })
    }

    /// New task under a temporary id, placed right after `after` or at the
    /// end of the collection.
    pub fn add(
        store: &TaskStore,
        new_task: NewTask,
        after: Option<&TaskId>,
        temp_id: TaskId,
    ) -> Result<Self> {
        new_task.validate()?;
        let index = match after {
            Some(anchor) => {
                store
                    .position_of(anchor)
                    .ok_or_else(|| BoardError::TaskNotFound { id: anchor.clone() })?
                    + 1
            }
            None => store.len(),
        };

        let task = new_task.into_task(temp_id, None);
        let placed = splice(store.all().to_vec(), index, task, None);

        let mut remote = Vec::new();
        let mut changes = Vec::new();
        for (task, original) in placed {
            match original {
                None => remote.insert(0, RemoteCall::Create { task: task.clone() }),
                Some(original) => remote.push(RemoteCall::Patch {
                    id: task.id.clone(),
                    patch: TaskPatch::diff(&original, &task),
                }),
            }
            changes.push(Change::Upsert(task));
        }

        Ok(Self {
            operation: "add task",
            changes,
            remote,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct UndoEntry {
    id: TaskId,
    before: Option<Task>,
    after: Option<Task>,
}

/// Restores the tasks a [`Mutation`] touched.
///
/// Reverting skips tasks that changed again after the mutation was applied:
/// a newer local edit wins over the rollback of an older one. Tasks the
/// mutation created are removed regardless.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "an undo token must be reverted or discarded"]
pub struct UndoToken {
    entries: Vec<UndoEntry>,
}

impl UndoToken {
    /// Rolls the store back; returns how many tasks were restored.
    ///
    /// `renamed` maps temporary ids to the permanent ids the store has
    /// since switched to.
    pub fn revert(self, store: &mut TaskStore, renamed: &HashMap<TaskId, TaskId>) -> usize {
        let mut restored = 0;
        for entry in self.entries.into_iter().rev() {
            let id = renamed.get(&entry.id).cloned().unwrap_or(entry.id);
            let Some(mut before) = entry.before else {
                if store.remove(&id).is_some() {
                    restored += 1;
                }
                continue;
            };
            let after = entry.after.map(|mut task| {
                task.id = id.clone();
                task
            });
            if store.get(&id) != after.as_ref() {
                debug!("Skipping rollback of task {id}: superseded locally");
                continue;
            }
            before.id = id;
            store.upsert(before);
            restored += 1;
        }
        restored
    }

    /// Drops the token after a successful persist.
    pub fn discard(self) {}

    /// Ids of the tasks this token can restore.
    pub fn task_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.entries.iter().map(|e| &e.id)
    }
}

/// Inserts `moved` at `index` of `others` (collection order, `moved` absent)
/// and assigns sequences so the resulting order holds.
///
/// `moved` keeps its sequence when it already fits between the new
/// neighbours, and otherwise takes a free integer between them. Only when
/// the neighbours leave no gap is the whole collection renumbered from 1.
/// Returns every task whose fields differ from before, paired with its
/// previous value (`previous` for `moved`, `None` when it is new).
pub(crate) fn splice(
    mut others: Vec<Task>,
    index: usize,
    moved: Task,
    previous: Option<Task>,
) -> Vec<(Task, Option<Task>)> {
    let index = index.min(others.len());
    let lower = index.checked_sub(1).map(|i| others[i].sequence);
    let upper = others.get(index).and_then(|t| t.sequence);

    let fits = |s: i64| {
        let above = match lower {
            None => true,
            Some(Some(low)) => s > low,
            Some(None) => false,
        };
        above && upper.map_or(true, |high| s < high)
    };

    let slot = match (lower, upper) {
        _ if moved.sequence.is_some_and(fits) => moved.sequence,
        // The predecessor is unsequenced: its place depends on ids alone
        (Some(None), _) => None,
        (None, None) => Some(1),
        (Some(Some(low)), None) => low.checked_add(1),
        (None, Some(high)) => high.checked_sub(1),
        (Some(Some(low)), Some(high)) if high - low >= 2 => Some(low + (high - low) / 2),
        _ => None,
    };

    if let Some(sequence) = slot {
        let mut placed = moved;
        placed.sequence = Some(sequence);
        return if previous.as_ref() == Some(&placed) {
            Vec::new()
        } else {
            vec![(placed, previous)]
        };
    }

    let moved_id = moved.id.clone();
    others.insert(index, moved);
    let mut changed = Vec::new();
    for (position, task) in others.iter_mut().enumerate() {
        let before = if task.id == moved_id {
            previous.clone()
        } else {
            Some(task.clone())
        };
        task.sequence = Some(position as i64 + 1);
        if before.as_ref() != Some(&*task) {
            changed.push((task.clone(), before));
        }
    }
    changed
}

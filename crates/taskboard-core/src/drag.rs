//! Drag commit planning.
//!
//! [`plan_drag`] turns a drop event into a [`Mutation`]: the moved task with
//! its new status/assignee and sequence, any neighbours that had to be
//! resequenced, and the patches that persist all of it. Planning is pure;
//! the board applies the mutation and owns rollback.

use serde::{Deserialize, Serialize};

use crate::{
    error::{BoardError, Result},
    models::{BoardFilter, ColumnKey, Task, TaskId, TaskPatch, TaskStatus, ViewMode, UNASSIGNED},
    mutation::{splice, Change, Mutation, RemoteCall},
    projection::column_tasks,
    store::TaskStore,
};

/// A completed drag-and-drop gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragResult {
    pub task_id: TaskId,
    pub source: ColumnKey,
    /// `None` when the task was dropped outside any column
    pub destination: Option<ColumnKey>,
    /// Requested index within the destination column
    pub dest_index: usize,
}

impl DragResult {
    pub fn new(task_id: TaskId, source: ColumnKey, destination: ColumnKey, dest_index: usize) -> Self {
        Self {
            task_id,
            source,
            destination: Some(destination),
            dest_index,
        }
    }

    /// Builds a drag result from the string column ids a front end reports.
    pub fn from_encoded(
        mode: ViewMode,
        task_id: TaskId,
        source: &str,
        destination: Option<&str>,
        dest_index: usize,
    ) -> Result<Self> {
        Ok(Self {
            task_id,
            source: ColumnKey::decode(mode, source)?,
            destination: destination
                .map(|key| ColumnKey::decode(mode, key))
                .transpose()?,
            dest_index,
        })
    }
}

/// What a committed drag did to the board.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Dropped in place or outside any column
    Unchanged,
    /// The task moved; `resequenced` counts other tasks that were renumbered
    Moved { task: Task, resequenced: usize },
}

impl DragOutcome {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, DragOutcome::Unchanged)
    }
}

/// Board context a drag is planned against.
#[derive(Debug, Clone, Copy)]
pub struct DragContext<'a> {
    pub mode: ViewMode,
    pub filter: &'a BoardFilter,
    /// Identity of the person dragging, used when a task has no assignee
    pub actor: Option<&'a str>,
}

/// Picks the assignee for a drop that does not name one: the current value
/// when it is a person, else the acting user, else [`UNASSIGNED`].
pub fn resolve_assignee(current: &str, actor: Option<&str>) -> String {
    let is_person = |a: &str| !a.trim().is_empty() && !TaskStatus::is_sentinel(a);
    if is_person(current) {
        current.to_string()
    } else if let Some(actor) = actor.filter(|a| is_person(a)) {
        actor.to_string()
    } else {
        UNASSIGNED.to_string()
    }
}

/// Plans the store mutation for `drag`; `None` means nothing changes.
pub fn plan_drag(store: &TaskStore, drag: &DragResult, ctx: DragContext<'_>) -> Result<Option<Mutation>> {
    let task = store
        .get(&drag.task_id)
        .ok_or_else(|| BoardError::TaskNotFound {
            id: drag.task_id.clone(),
        })?;
    let Some(destination) = &drag.destination else {
        return Ok(None);
    };
    for key in [&drag.source, destination] {
        if key.view_mode() != ctx.mode {
            return Err(BoardError::InvalidColumnKey {
                key: key.encode(),
                reason: format!("not a column of the '{}' view", ctx.mode.as_str()),
            });
        }
    }
    if !drag.source.contains(task) {
        return Err(BoardError::InvalidColumnKey {
            key: drag.source.encode(),
            reason: format!("task {} is not in this column", task.id),
        });
    }

    if &drag.source == destination {
        let column = column_tasks(store.all(), destination, ctx.filter);
        if column.iter().position(|t| t.id == task.id) == Some(drag.dest_index) {
            return Ok(None);
        }
    }

    let mut updated = task.clone();
    if let Some(status) = destination.target_status() {
        updated.status = status;
    }
    updated.assigned_to = match destination.target_assignee() {
        Some(assignee) => assignee.to_string(),
        None => resolve_assignee(&task.assigned_to, ctx.actor),
    };

    let others: Vec<Task> = store
        .all()
        .iter()
        .filter(|t| t.id != task.id)
        .cloned()
        .collect();
    let index = insertion_index(&others, destination, drag.dest_index, ctx.filter);

    let placed = splice(others, index, updated, Some(task.clone()));
    if placed.is_empty() {
        return Ok(None);
    }

    let mut changes = Vec::with_capacity(placed.len());
    let mut remote = Vec::with_capacity(placed.len());
    for (after, before) in placed {
        if let Some(before) = &before {
            let patch = TaskPatch::diff(before, &after);
            let call = RemoteCall::Patch {
                id: after.id.clone(),
                patch,
            };
            // The dragged task's patch goes first
            if after.id == task.id {
                remote.insert(0, call);
            } else {
                remote.push(call);
            }
        }
        changes.push(Change::Upsert(after));
    }

    Ok(Some(Mutation {
        operation: "move task",
        changes,
        remote,
    }))
}

/// Position in the whole collection (without the moved task) that puts the
/// task at `dest_index` of the destination column.
fn insertion_index(
    others: &[Task],
    destination: &ColumnKey,
    dest_index: usize,
    filter: &BoardFilter,
) -> usize {
    let column = column_tasks(others, destination, filter);
    let position = |id: &TaskId| others.iter().position(|t| &t.id == id);

    match column.get(dest_index) {
        Some(neighbour) => position(&neighbour.id).unwrap_or(others.len()),
        None => column
            .last()
            .and_then(|last| position(&last.id))
            .map_or(others.len(), |i| i + 1),
    }
}

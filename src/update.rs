//! Task creation and field edits applied as one unit.
//!
//! Both run inside a single locked read-modify-write so that the edges they
//! add or remove land together with the task they belong to.

use serde::Serialize;

use crate::error::{Error, Result, Warning};
use crate::graph::{apply_edge_batch, complete_task, resolve_index, EdgeDirection, EdgeOutcome};
use crate::store::TaskStore;
use crate::task::{now_timestamp, SessionLog, Task, TaskStatus};

/// Input for a new task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    /// Ids or id prefixes of the tasks that block the new one
    pub blocked_by: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
    pub task: Task,
    pub edges: Vec<EdgeOutcome>,
    #[serde(skip)]
    pub warnings: Vec<Warning>,
}

/// Create a task and persist it
///
/// Without blockers the task is appended to the document. With blockers the
/// whole document is rewritten so that each blocker records the new task in
/// its `blocks` list; unresolved blockers become warnings.
pub fn create_task(store: &TaskStore, new: NewTask) -> Result<CreateOutcome> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(Error::InvalidArgument("title cannot be empty".to_string()));
    }
    let task = Task::new(title, new.description);

    if new.blocked_by.is_empty() {
        store.append_one(&task)?;
        tracing::info!(task = %task.id, "created task");
        return Ok(CreateOutcome {
            task,
            edges: Vec::new(),
            warnings: Vec::new(),
        });
    }

    let now = task.created_at.clone();
    let id = task.id.clone();
    store.update(|tasks| {
        tasks.push(task);
        let batch = apply_edge_batch(tasks, &id, &new.blocked_by, EdgeDirection::BlockedBy, true, &now)?;
        let created = tasks
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or_else(|| Error::OperationFailed(format!("task {id} vanished during creation")))?;
        tracing::info!(task = %id, blockers = batch.edges.len(), "created task");
        Ok(CreateOutcome {
            task: created,
            edges: batch.edges,
            warnings: batch.warnings,
        })
    })
}

/// Requested edits to one task; `None` and empty lists mean "leave alone"
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    /// 0-based index into the session logs
    pub delete_log: Option<usize>,
    pub log: Option<String>,
    pub add_blocks: Vec<String>,
    pub add_blocked_by: Vec<String>,
    pub remove_blocks: Vec<String>,
    pub remove_blocked_by: Vec<String>,
    pub status: Option<TaskStatus>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.delete_log.is_none()
            && self.log.is_none()
            && self.add_blocks.is_empty()
            && self.add_blocked_by.is_empty()
            && self.remove_blocks.is_empty()
            && self.remove_blocked_by.is_empty()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateOutcome {
    pub id: String,
    /// One line per applied edit, in application order
    pub changes: Vec<String>,
    pub edges: Vec<EdgeOutcome>,
    /// Tasks reopened because they lost their last blocker
    pub unblocked: Vec<String>,
    #[serde(skip)]
    pub warnings: Vec<Warning>,
}

/// Apply `update` to the task matching `id` within `tasks`
///
/// Edits apply in a fixed order: title, description, log deletion, new log,
/// added blocks, added blockers, removed blocks, removed blockers, status.
/// Marking a task `done` releases its dependents. An out-of-range log index
/// fails before anything is changed.
pub fn apply_update(tasks: &mut [Task], id: &str, update: &TaskUpdate, now: &str) -> Result<UpdateOutcome> {
    if update.is_empty() {
        return Err(Error::InvalidArgument("no changes specified".to_string()));
    }
    let idx = resolve_index(tasks, id)?;
    if let Some(title) = &update.title {
        if title.trim().is_empty() {
            return Err(Error::InvalidArgument("title cannot be empty".to_string()));
        }
    }
    if let Some(index) = update.delete_log {
        let len = tasks[idx].sessions.len();
        if index >= len {
            return Err(Error::InvalidLogIndex { index, len });
        }
    }

    let target = tasks[idx].id.clone();
    let mut outcome = UpdateOutcome {
        id: target.clone(),
        ..UpdateOutcome::default()
    };

    {
        let task = &mut tasks[idx];
        task.touch(now);

        if let Some(title) = &update.title {
            task.title = title.trim().to_string();
            outcome.changes.push(format!("title set to '{}'", task.title));
        }
        if let Some(description) = &update.description {
            task.description = description.clone();
            outcome.changes.push("description updated".to_string());
        }
        if let Some(index) = update.delete_log {
            task.sessions.remove(index);
            outcome.changes.push(format!("session log #{index} deleted"));
        }
        if let Some(log) = &update.log {
            task.sessions.push(SessionLog::new(now, log.clone()));
            outcome.changes.push("session log added".to_string());
        }
    }

    let batches = [
        (&update.add_blocks, EdgeDirection::Blocks, true),
        (&update.add_blocked_by, EdgeDirection::BlockedBy, true),
        (&update.remove_blocks, EdgeDirection::Blocks, false),
        (&update.remove_blocked_by, EdgeDirection::BlockedBy, false),
    ];
    for (refs, direction, add) in batches {
        if refs.is_empty() {
            continue;
        }
        let batch = apply_edge_batch(tasks, &target, refs, direction, add, now)?;
        for edge in &batch.edges {
            let verb = if add { "blocks" } else { "no longer blocks" };
            outcome.changes.push(format!(
                "{} {verb} {}",
                crate::task::short_id(&edge.blocker),
                crate::task::short_id(&edge.blocked)
            ));
        }
        outcome.unblocked.extend(batch.unblocked().map(str::to_string));
        outcome.edges.extend(batch.edges);
        outcome.warnings.extend(batch.warnings);
    }

    if let Some(status) = update.status {
        if status == TaskStatus::Done {
            outcome.unblocked.extend(complete_task(tasks, &target, now)?);
        } else if let Some(task) = tasks.iter_mut().find(|task| task.id == target) {
            task.status = status;
            task.touch(now);
        }
        outcome.changes.push(format!("status set to {status}"));
    }

    Ok(outcome)
}

/// Load, apply `update` to `id` and save under one lock
pub fn update_task(store: &TaskStore, id: &str, update: &TaskUpdate) -> Result<UpdateOutcome> {
    let now = now_timestamp();
    let outcome = store.update(|tasks| apply_update(tasks, id, update, &now))?;
    tracing::info!(task = %outcome.id, changes = outcome.changes.len(), "updated task");
    Ok(outcome)
}

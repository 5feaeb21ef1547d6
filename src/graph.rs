//! Dependency graph maintenance over an in-memory task collection.
//!
//! Every edge is stored twice: the blocker lists the blocked task in
//! `blocks`, the blocked task lists the blocker in `blocked_by`. Each
//! operation here updates both halves before returning, applies the
//! automatic status transitions (`open`/`in_progress` -> `blocked` when a
//! live blocker is added, `blocked` -> `open` once every remaining blocker
//! is `done`) and bumps `updated_at` on every task it touches.
//!
//! Tasks are addressed by id or unique id prefix.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::{Error, Result, Warning};
use crate::task::{Task, TaskStatus};

/// Result of adding or removing one edge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EdgeOutcome {
    pub blocker: String,
    pub blocked: String,
    /// Whether either half of the edge actually changed
    pub changed: bool,
    /// Tasks moved from `blocked` to `open` by this operation
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unblocked: Vec<String>,
}

/// Result of applying a comma-list of edge references
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub edges: Vec<EdgeOutcome>,
    pub warnings: Vec<Warning>,
}

impl BatchOutcome {
    pub fn unblocked(&self) -> impl Iterator<Item = &str> {
        self.edges
            .iter()
            .flat_map(|edge| edge.unblocked.iter().map(String::as_str))
    }
}

/// Which side of the edges the anchor task sits on in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    /// The anchor blocks each referenced task
    Blocks,
    /// Each referenced task blocks the anchor
    BlockedBy,
}

/// Result of deleting a task
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub removed: Task,
    pub unblocked: Vec<String>,
}

/// Resolve an id or id prefix to a position in `tasks`
///
/// An exact id match wins. Otherwise the prefix must match exactly one task;
/// no match is `NotFound`, several are `Ambiguous` with every candidate.
pub fn resolve_index(tasks: &[Task], prefix: &str) -> Result<usize> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
    }

    let exact: Vec<usize> = positions(tasks, |task| task.id == prefix);
    if exact.len() == 1 {
        return Ok(exact[0]);
    }

    let matches = if exact.is_empty() {
        positions(tasks, |task| task.id.starts_with(prefix))
    } else {
        exact
    };

    match matches.as_slice() {
        [] => Err(Error::NotFound(prefix.to_string())),
        [only] => Ok(*only),
        many => Err(Error::Ambiguous {
            prefix: prefix.to_string(),
            candidates: many.iter().map(|&idx| tasks[idx].id.clone()).collect(),
        }),
    }
}

fn positions(tasks: &[Task], pred: impl Fn(&Task) -> bool) -> Vec<usize> {
    tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| pred(task))
        .map(|(idx, _)| idx)
        .collect()
}

fn push_unique(list: &mut Vec<String>, id: &str) -> bool {
    if list.iter().any(|existing| existing == id) {
        return false;
    }
    list.push(id.to_string());
    true
}

fn remove_id(list: &mut Vec<String>, id: &str) -> bool {
    let before = list.len();
    list.retain(|existing| existing != id);
    list.len() != before
}

/// Ids of every `done` task
fn done_ids(tasks: &[Task]) -> HashSet<String> {
    tasks
        .iter()
        .filter(|task| task.is_done())
        .map(|task| task.id.clone())
        .collect()
}

/// `blocked` -> `open` once every remaining blocker is `done`
fn release_if_unblocked(task: &mut Task, done: &HashSet<String>) -> bool {
    let clear = task.blocked_by.iter().all(|id| done.contains(id));
    if clear && task.status == TaskStatus::Blocked {
        task.status = TaskStatus::Open;
        tracing::info!(task = %task.short_id(), "task is now unblocked");
        return true;
    }
    false
}

/// Record that `blocker` blocks `blocked`
///
/// Idempotent. The blocked task becomes `blocked` unless it is already
/// `done` or the blocker is. Its `updated_at` is always bumped; the
/// blocker's only when the edge is new to it.
pub fn add_block_edge(
    tasks: &mut [Task],
    blocker: &str,
    blocked: &str,
    now: &str,
) -> Result<EdgeOutcome> {
    let blocker_idx = resolve_index(tasks, blocker)?;
    let blocked_idx = resolve_index(tasks, blocked)?;
    if blocker_idx == blocked_idx {
        return Err(Error::InvalidArgument(format!(
            "task {} cannot block itself",
            tasks[blocker_idx].short_id()
        )));
    }

    let blocker_id = tasks[blocker_idx].id.clone();
    let blocked_id = tasks[blocked_idx].id.clone();
    let blocker_done = tasks[blocker_idx].is_done();

    let new_on_blocker = push_unique(&mut tasks[blocker_idx].blocks, &blocked_id);
    if new_on_blocker {
        tasks[blocker_idx].touch(now);
    }

    let target = &mut tasks[blocked_idx];
    let new_on_blocked = push_unique(&mut target.blocked_by, &blocker_id);
    if !blocker_done && !matches!(target.status, TaskStatus::Done | TaskStatus::Blocked) {
        target.status = TaskStatus::Blocked;
    }
    target.touch(now);

    tracing::debug!(blocker = %blocker_id, blocked = %blocked_id, "added block edge");
    Ok(EdgeOutcome {
        blocker: blocker_id,
        blocked: blocked_id,
        changed: new_on_blocker || new_on_blocked,
        unblocked: Vec::new(),
    })
}

/// Drop the edge `blocker` -> `blocked` from both sides if present
pub fn remove_block_edge(
    tasks: &mut [Task],
    blocker: &str,
    blocked: &str,
    now: &str,
) -> Result<EdgeOutcome> {
    let blocker_idx = resolve_index(tasks, blocker)?;
    let blocked_idx = resolve_index(tasks, blocked)?;

    let blocker_id = tasks[blocker_idx].id.clone();
    let blocked_id = tasks[blocked_idx].id.clone();

    let removed_from_blocker = remove_id(&mut tasks[blocker_idx].blocks, &blocked_id);
    if removed_from_blocker {
        tasks[blocker_idx].touch(now);
    }

    let mut unblocked = Vec::new();
    let done = done_ids(tasks);
    let target = &mut tasks[blocked_idx];
    let removed_from_blocked = remove_id(&mut target.blocked_by, &blocker_id);
    if removed_from_blocked {
        target.touch(now);
        if release_if_unblocked(target, &done) {
            unblocked.push(blocked_id.clone());
        }
    }

    tracing::debug!(blocker = %blocker_id, blocked = %blocked_id, "removed block edge");
    Ok(EdgeOutcome {
        blocker: blocker_id,
        blocked: blocked_id,
        changed: removed_from_blocker || removed_from_blocked,
        unblocked,
    })
}

/// Add or remove edges between `anchor` and each of `refs`
///
/// References that do not resolve (or resolve to the anchor) are reported
/// as warnings; the remaining ones still apply.
pub fn apply_edge_batch(
    tasks: &mut [Task],
    anchor: &str,
    refs: &[String],
    direction: EdgeDirection,
    add: bool,
    now: &str,
) -> Result<BatchOutcome> {
    let anchor_id = tasks[resolve_index(tasks, anchor)?].id.clone();
    let mut outcome = BatchOutcome::default();

    for reference in refs.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
        let other_id = match resolve_index(tasks, reference) {
            Ok(idx) => tasks[idx].id.clone(),
            Err(err) => {
                let warning = edge_warning(reference, err)?;
                tracing::warn!(reference, "{warning}");
                outcome.warnings.push(warning);
                continue;
            }
        };
        if other_id == anchor_id {
            let warning = Warning::SelfReference(reference.to_string());
            tracing::warn!(reference, "{warning}");
            outcome.warnings.push(warning);
            continue;
        }

        let (blocker, blocked) = match direction {
            EdgeDirection::Blocks => (anchor_id.as_str(), other_id.as_str()),
            EdgeDirection::BlockedBy => (other_id.as_str(), anchor_id.as_str()),
        };
        let edge = if add {
            add_block_edge(tasks, blocker, blocked, now)?
        } else {
            remove_block_edge(tasks, blocker, blocked, now)?
        };
        outcome.edges.push(edge);
    }

    Ok(outcome)
}

fn edge_warning(reference: &str, err: Error) -> Result<Warning> {
    match err {
        Error::NotFound(_) => Ok(Warning::InvalidEdgeReference(reference.to_string())),
        Error::Ambiguous { prefix, candidates } => {
            Ok(Warning::AmbiguousEdgeReference { prefix, candidates })
        }
        other => Err(other),
    }
}

/// Mark a task `done` and release the tasks it was blocking
///
/// Only direct dependents are considered; each of them loses this blocker
/// (both halves of the edge go) and reopens once every blocker it still
/// has is `done`.
pub fn complete_task(tasks: &mut [Task], id: &str, now: &str) -> Result<Vec<String>> {
    let idx = resolve_index(tasks, id)?;
    tasks[idx].status = TaskStatus::Done;
    tasks[idx].touch(now);
    Ok(cascade_completion(tasks, idx, now))
}

/// Release dependents of an already-`done` task at `idx`
pub(crate) fn cascade_completion(tasks: &mut [Task], idx: usize, now: &str) -> Vec<String> {
    let done_id = tasks[idx].id.clone();
    let dependents = tasks[idx].blocks.clone();
    let done = done_ids(tasks);
    let mut released = Vec::new();
    let mut unblocked = Vec::new();

    for dependent_id in &dependents {
        let Some(dep) = tasks.iter_mut().find(|task| &task.id == dependent_id) else {
            continue;
        };
        if !remove_id(&mut dep.blocked_by, &done_id) {
            continue;
        }
        dep.touch(now);
        released.push(dependent_id.clone());
        if release_if_unblocked(dep, &done) {
            unblocked.push(dependent_id.clone());
        }
    }

    if !released.is_empty() {
        tasks[idx].blocks.retain(|id| !released.contains(id));
    }
    unblocked
}

/// Remove a task and every edge that mentions it
pub fn delete_task(tasks: &mut Vec<Task>, id: &str, now: &str) -> Result<DeleteOutcome> {
    let idx = resolve_index(tasks, id)?;
    let removed = tasks.remove(idx);
    let done = done_ids(tasks);
    let mut unblocked = Vec::new();

    for task in tasks.iter_mut() {
        let in_blocks = remove_id(&mut task.blocks, &removed.id);
        let in_blocked_by = remove_id(&mut task.blocked_by, &removed.id);
        if in_blocks || in_blocked_by {
            task.touch(now);
        }
        if in_blocked_by && release_if_unblocked(task, &done) {
            unblocked.push(task.id.clone());
        }
    }

    tracing::debug!(task = %removed.id, "deleted task");
    Ok(DeleteOutcome { removed, unblocked })
}

/// Whether `task` can be worked on now
///
/// Not `done`, and every blocker exists and is `done`.
pub fn is_ready(task: &Task, by_id: &HashMap<&str, &Task>) -> bool {
    if task.is_done() {
        return false;
    }
    task.blocked_by.iter().all(|blocker| {
        by_id
            .get(blocker.as_str())
            .is_some_and(|blocker| blocker.is_done())
    })
}

/// Tasks that are ready, in collection order
pub fn ready_set(tasks: &[Task]) -> Vec<&Task> {
    let by_id: HashMap<&str, &Task> = tasks.iter().map(|task| (task.id.as_str(), task)).collect();
    tasks.iter().filter(|task| is_ready(task, &by_id)).collect()
}

/// Find a cycle in the `blocked_by` relation
///
/// Depth-first from every unvisited task in collection order, following
/// `blocked_by` in list order. The first edge back into the current path
/// yields the cycle: the path from the repeated task onwards, closed by the
/// repeated task again. References to unknown ids are dead ends.
///
/// The traversal keeps its own stack, so depth is bounded by memory rather
/// than the call stack.
pub fn detect_cycle(tasks: &[Task]) -> Option<Vec<String>> {
    let by_id: HashMap<&str, &Task> = tasks
        .iter()
        .filter(|task| !task.id.is_empty())
        .map(|task| (task.id.as_str(), task))
        .collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_path: HashMap<&str, usize> = HashMap::new();

    for root in tasks.iter().map(|task| task.id.as_str()) {
        if root.is_empty() || !visited.insert(root) {
            continue;
        }

        let mut path: Vec<&str> = vec![root];
        let mut cursors: Vec<usize> = vec![0];
        on_path.insert(root, 0);

        while let Some(&node) = path.last() {
            let depth = path.len() - 1;
            let deps: &[String] = by_id
                .get(node)
                .map(|task| task.blocked_by.as_slice())
                .unwrap_or(&[]);

            let Some(next) = deps.get(cursors[depth]).map(String::as_str) else {
                on_path.remove(node);
                path.pop();
                cursors.pop();
                continue;
            };
            cursors[depth] += 1;

            if let Some(&start) = on_path.get(next) {
                let mut cycle: Vec<String> = path[start..].iter().map(|id| id.to_string()).collect();
                cycle.push(next.to_string());
                return Some(cycle);
            }
            if visited.insert(next) {
                on_path.insert(next, path.len());
                path.push(next);
                cursors.push(0);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2030-01-01T00:00:00.000000+00:00";

    fn task(id: &str) -> Task {
        let mut task = Task::new(format!("task {id}"), "");
        task.id = id.to_string();
        task.created_at = "2024-01-01T00:00:00+00:00".to_string();
        task.updated_at = "2024-01-01T00:00:00+00:00".to_string();
        task
    }

    fn get<'a>(tasks: &'a [Task], id: &str) -> &'a Task {
        tasks.iter().find(|task| task.id == id).unwrap()
    }

    fn get_mut<'a>(tasks: &'a mut [Task], id: &str) -> &'a mut Task {
        tasks.iter_mut().find(|task| task.id == id).unwrap()
    }

    #[test]
    fn resolve_prefers_unique_prefix() {
        let tasks = vec![task("aaa111"), task("aab222"), task("bbb333")];
        assert_eq!(resolve_index(&tasks, "b").unwrap(), 2);
        assert_eq!(resolve_index(&tasks, "aab").unwrap(), 1);
        match resolve_index(&tasks, "aa") {
            Err(Error::Ambiguous { candidates, .. }) => {
                assert_eq!(candidates, vec!["aaa111", "aab222"])
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
        assert!(matches!(resolve_index(&tasks, "zz"), Err(Error::NotFound(_))));
        assert!(matches!(resolve_index(&tasks, " "), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn add_edge_is_symmetric_and_idempotent() {
        let mut tasks = vec![task("a1"), task("b1")];
        let first = add_block_edge(&mut tasks, "a", "b", NOW).unwrap();
        assert!(first.changed);
        assert_eq!(get(&tasks, "a1").blocks, vec!["b1"]);
        assert_eq!(get(&tasks, "b1").blocked_by, vec!["a1"]);
        assert_eq!(get(&tasks, "b1").status, TaskStatus::Blocked);
        assert_eq!(get(&tasks, "a1").updated_at, NOW);
        assert_eq!(get(&tasks, "b1").updated_at, NOW);

        tasks[0].updated_at = "2024-01-01T00:00:00+00:00".to_string();
        let second = add_block_edge(&mut tasks, "a1", "b1", NOW).unwrap();
        assert!(!second.changed);
        assert_eq!(get(&tasks, "a1").blocks.len(), 1);
        assert_eq!(get(&tasks, "b1").blocked_by.len(), 1);
        assert_eq!(get(&tasks, "a1").updated_at, "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn add_edge_leaves_done_tasks_done() {
        let mut tasks = vec![task("a1"), task("b1")];
        tasks[1].status = TaskStatus::Done;
        add_block_edge(&mut tasks, "a1", "b1", NOW).unwrap();
        assert_eq!(get(&tasks, "b1").status, TaskStatus::Done);
    }

    #[test]
    fn add_edge_from_done_blocker_does_not_block() {
        let mut tasks = vec![task("a1"), task("b1")];
        tasks[0].status = TaskStatus::Done;
        add_block_edge(&mut tasks, "a1", "b1", NOW).unwrap();
        assert_eq!(get(&tasks, "b1").status, TaskStatus::Open);
        assert_eq!(get(&tasks, "b1").blocked_by, vec!["a1"]);
    }

    #[test]
    fn self_edge_is_rejected() {
        let mut tasks = vec![task("a1")];
        assert!(matches!(
            add_block_edge(&mut tasks, "a1", "a1", NOW),
            Err(Error::InvalidArgument(_))
        ));
        assert!(tasks[0].blocks.is_empty());
    }

    #[test]
    fn remove_edge_unblocks_when_last_blocker_goes() {
        let mut tasks = vec![task("a1"), task("b1"), task("c1")];
        add_block_edge(&mut tasks, "a1", "c1", NOW).unwrap();
        add_block_edge(&mut tasks, "b1", "c1", NOW).unwrap();

        let first = remove_block_edge(&mut tasks, "a1", "c1", NOW).unwrap();
        assert!(first.changed);
        assert!(first.unblocked.is_empty());
        assert_eq!(get(&tasks, "c1").status, TaskStatus::Blocked);
        assert!(get(&tasks, "a1").blocks.is_empty());

        let second = remove_block_edge(&mut tasks, "b1", "c1", NOW).unwrap();
        assert_eq!(second.unblocked, vec!["c1"]);
        assert_eq!(get(&tasks, "c1").status, TaskStatus::Open);
        assert!(get(&tasks, "c1").blocked_by.is_empty());
    }

    #[test]
    fn remove_missing_edge_is_a_noop() {
        let mut tasks = vec![task("a1"), task("b1")];
        let outcome = remove_block_edge(&mut tasks, "a1", "b1", NOW).unwrap();
        assert!(!outcome.changed);
        assert_eq!(get(&tasks, "b1").updated_at, "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn batch_applies_resolved_and_warns_on_rest() {
        let mut tasks = vec![task("a1"), task("b1"), task("b2"), task("c1")];
        let refs = vec!["c1".to_string(), "zz".to_string(), "b".to_string(), "a1".to_string()];
        let outcome =
            apply_edge_batch(&mut tasks, "a1", &refs, EdgeDirection::Blocks, true, NOW).unwrap();

        assert_eq!(outcome.edges.len(), 1);
        assert_eq!(get(&tasks, "a1").blocks, vec!["c1"]);
        assert_eq!(outcome.warnings.len(), 3);
        assert_eq!(outcome.warnings[0], Warning::InvalidEdgeReference("zz".to_string()));
        assert!(matches!(outcome.warnings[1], Warning::AmbiguousEdgeReference { .. }));
        assert_eq!(outcome.warnings[2], Warning::SelfReference("a1".to_string()));
    }

    #[test]
    fn batch_blocked_by_direction() {
        let mut tasks = vec![task("a1"), task("b1")];
        let refs = vec!["a1".to_string()];
        apply_edge_batch(&mut tasks, "b1", &refs, EdgeDirection::BlockedBy, true, NOW).unwrap();
        assert_eq!(get(&tasks, "a1").blocks, vec!["b1"]);
        assert_eq!(get(&tasks, "b1").status, TaskStatus::Blocked);

        let outcome =
            apply_edge_batch(&mut tasks, "b1", &refs, EdgeDirection::BlockedBy, false, NOW)
                .unwrap();
        assert_eq!(outcome.unblocked().collect::<Vec<_>>(), vec!["b1"]);
    }

    #[test]
    fn completion_cascades_one_hop() {
        let mut tasks = vec![task("a1"), task("b1"), task("c1")];
        add_block_edge(&mut tasks, "a1", "b1", NOW).unwrap();
        add_block_edge(&mut tasks, "b1", "c1", NOW).unwrap();

        let ready: Vec<&str> = ready_set(&tasks).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ready, vec!["a1"]);

        let unblocked = complete_task(&mut tasks, "a1", NOW).unwrap();
        assert_eq!(unblocked, vec!["b1"]);
        assert_eq!(get(&tasks, "b1").status, TaskStatus::Open);
        assert_eq!(get(&tasks, "c1").status, TaskStatus::Blocked);
        assert!(get(&tasks, "a1").blocks.is_empty());

        let ready: Vec<&str> = ready_set(&tasks).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ready, vec!["b1"]);

        complete_task(&mut tasks, "b1", NOW).unwrap();
        assert_eq!(get(&tasks, "c1").status, TaskStatus::Open);
    }

    #[test]
    fn completion_keeps_other_blockers() {
        let mut tasks = vec![task("a1"), task("b1"), task("c1")];
        add_block_edge(&mut tasks, "a1", "c1", NOW).unwrap();
        add_block_edge(&mut tasks, "b1", "c1", NOW).unwrap();

        let unblocked = complete_task(&mut tasks, "a1", NOW).unwrap();
        assert!(unblocked.is_empty());
        assert_eq!(get(&tasks, "c1").blocked_by, vec!["b1"]);
        assert_eq!(get(&tasks, "c1").status, TaskStatus::Blocked);
    }

    #[test]
    fn delete_cleans_up_edges() {
        let mut tasks = vec![task("a1"), task("x1"), task("c1")];
        add_block_edge(&mut tasks, "a1", "x1", NOW).unwrap();
        add_block_edge(&mut tasks, "x1", "c1", NOW).unwrap();

        let outcome = delete_task(&mut tasks, "x1", NOW).unwrap();
        assert_eq!(outcome.removed.id, "x1");
        assert_eq!(outcome.unblocked, vec!["c1"]);
        assert_eq!(tasks.len(), 2);
        assert!(get(&tasks, "a1").blocks.is_empty());
        assert!(get(&tasks, "c1").blocked_by.is_empty());
        assert_eq!(get(&tasks, "c1").status, TaskStatus::Open);
    }

    /// `c1` is blocked by a finished `b1` and an open `a1`
    fn blocked_behind_done_and_open() -> Vec<Task> {
        let mut tasks = vec![task("a1"), task("b1"), task("c1")];
        get_mut(&mut tasks, "b1").status = TaskStatus::Done;
        add_block_edge(&mut tasks, "b1", "c1", NOW).unwrap();
        add_block_edge(&mut tasks, "a1", "c1", NOW).unwrap();
        assert_eq!(get(&tasks, "c1").status, TaskStatus::Blocked);
        tasks
    }

    #[test]
    fn completion_releases_when_remaining_blockers_are_done() {
        let mut tasks = blocked_behind_done_and_open();
        let unblocked = complete_task(&mut tasks, "a1", NOW).unwrap();
        assert_eq!(unblocked, vec!["c1"]);
        assert_eq!(get(&tasks, "c1").blocked_by, vec!["b1"]);
        assert_eq!(get(&tasks, "c1").status, TaskStatus::Open);
    }

    #[test]
    fn edge_removal_releases_when_remaining_blockers_are_done() {
        let mut tasks = blocked_behind_done_and_open();
        let outcome = remove_block_edge(&mut tasks, "a1", "c1", NOW).unwrap();
        assert_eq!(outcome.unblocked, vec!["c1"]);
        assert_eq!(get(&tasks, "c1").status, TaskStatus::Open);
    }

    #[test]
    fn delete_releases_when_remaining_blockers_are_done() {
        let mut tasks = blocked_behind_done_and_open();
        let outcome = delete_task(&mut tasks, "a1", NOW).unwrap();
        assert_eq!(outcome.unblocked, vec!["c1"]);
        assert_eq!(get(&tasks, "c1").status, TaskStatus::Open);
    }

    #[test]
    fn missing_blocker_keeps_task_blocked() {
        let mut tasks = vec![task("a1"), task("c1")];
        add_block_edge(&mut tasks, "a1", "c1", NOW).unwrap();
        get_mut(&mut tasks, "c1").blocked_by.push("gone".to_string());
        let unblocked = complete_task(&mut tasks, "a1", NOW).unwrap();
        assert!(unblocked.is_empty());
        assert_eq!(get(&tasks, "c1").status, TaskStatus::Blocked);
    }

    #[test]
    fn missing_blocker_is_not_ready() {
        let mut tasks = vec![task("a1")];
        tasks[0].blocked_by = vec!["ghost".to_string()];
        assert!(ready_set(&tasks).is_empty());
    }

    #[test]
    fn done_blockers_satisfy_readiness() {
        let mut tasks = vec![task("a1"), task("b1")];
        tasks[0].status = TaskStatus::Done;
        tasks[1].blocked_by = vec!["a1".to_string()];
        tasks[1].status = TaskStatus::InProgress;
        let ready: Vec<&str> = ready_set(&tasks).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ready, vec!["b1"]);
    }

    #[test]
    fn detects_three_cycle() {
        let mut tasks = vec![task("a"), task("b"), task("c")];
        tasks[0].blocked_by = vec!["b".to_string()];
        tasks[1].blocked_by = vec!["c".to_string()];
        tasks[2].blocked_by = vec!["a".to_string()];
        assert_eq!(
            detect_cycle(&tasks),
            Some(vec!["a".into(), "b".into(), "c".into(), "a".into()])
        );
    }

    #[test]
    fn cycle_is_sliced_from_repeated_node() {
        let mut tasks = vec![task("root"), task("b"), task("c")];
        tasks[0].blocked_by = vec!["b".to_string()];
        tasks[1].blocked_by = vec!["c".to_string()];
        tasks[2].blocked_by = vec!["b".to_string()];
        assert_eq!(
            detect_cycle(&tasks),
            Some(vec!["b".into(), "c".into(), "b".into()])
        );
    }

    #[test]
    fn acyclic_graphs_and_missing_refs() {
        let mut tasks = vec![task("a"), task("b"), task("c"), task("d")];
        tasks[0].blocked_by = vec!["b".to_string(), "c".to_string()];
        tasks[1].blocked_by = vec!["c".to_string(), "ghost".to_string()];
        tasks[3].blocked_by = vec!["c".to_string()];
        assert_eq!(detect_cycle(&tasks), None);
        assert_eq!(detect_cycle(&[]), None);
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let count = 100_000;
        let mut tasks: Vec<Task> = (0..count).map(|i| task(&format!("t{i}"))).collect();
        for i in 0..count - 1 {
            tasks[i].blocked_by = vec![format!("t{}", i + 1)];
        }
        assert_eq!(detect_cycle(&tasks), None);

        tasks[count - 1].blocked_by = vec!["t0".to_string()];
        let cycle = detect_cycle(&tasks).unwrap();
        assert_eq!(cycle.len(), count + 1);
        assert_eq!(cycle.first(), cycle.last());
    }
}

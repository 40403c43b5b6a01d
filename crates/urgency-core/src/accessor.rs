//! Host storage contract consumed by the urgency engine.
//!
//! The engine never touches a storage medium directly. It resolves tasks,
//! reads and writes the cached score property, and asks the host whether a
//! blocking task is still outstanding, all through [`TaskAccessor`].

use std::collections::{BTreeSet, HashSet};

use crate::error::{CoreError, Result};
use crate::task::{Task, TaskId};

/// Capability set a task host exposes to the scoring engine.
pub trait TaskAccessor {
    /// Resolve a task by identifier.
    ///
    /// # Errors
    /// Returns [`CoreError::TaskNotFound`] when no task has this identifier.
    fn resolve_task(&self, id: &str) -> Result<Task>;

    /// Read a named property of a task.
    fn property(&self, id: &str, name: &str) -> Result<Option<String>>;

    /// Write a named property of a task.
    fn set_property(&mut self, id: &str, name: &str, value: &str) -> Result<()>;

    /// Remove a named property of a task. Removing an absent property is a no-op.
    fn remove_property(&mut self, id: &str, name: &str) -> Result<()>;

    /// Whether the task is actionable (carries a workflow keyword) and has not
    /// reached a done keyword.
    fn is_actionable_not_done(&self, id: &str) -> Result<bool>;

    /// Tag set of a task, optionally including tags inherited from its outline
    /// ancestors.
    fn tags(&self, id: &str, include_inherited: bool) -> Result<BTreeSet<String>>;

    /// Identifiers of every task the host knows about, in host order.
    fn task_ids(&self) -> Result<Vec<TaskId>>;
}

/// Walk the outline chain starting at `task`, collecting own and inherited tags.
///
/// `lookup` returns `Ok(None)` for an ancestor that does not exist; the walk
/// stops there. Cycles in the outline chain are cut at the first repeat.
pub(crate) fn collect_tags<F>(task: &Task, include_inherited: bool, mut lookup: F) -> Result<BTreeSet<String>>
where
    F: FnMut(&str) -> Result<Option<Task>>,
{
    let mut tags: BTreeSet<String> = task.tags.iter().cloned().collect();
    if !include_inherited {
        return Ok(tags);
    }

    let mut seen: HashSet<TaskId> = HashSet::new();
    seen.insert(task.id.clone());
    let mut next = task.outline_parent.clone();
    while let Some(ancestor_id) = next {
        if !seen.insert(ancestor_id.clone()) {
            break;
        }
        let Some(ancestor) = lookup(&ancestor_id)? else {
            break;
        };
        tags.extend(ancestor.tags.iter().cloned());
        next = ancestor.outline_parent.clone();
    }
    Ok(tags)
}

/// Map a lookup miss onto [`CoreError::TaskNotFound`].
pub(crate) fn require(task: Option<Task>, id: &str) -> Result<Task> {
    task.ok_or_else(|| CoreError::TaskNotFound(id.to_string()))
}

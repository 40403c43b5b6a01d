//! In-process task store.
//!
//! Holds tasks in insertion order and answers the [`TaskAccessor`] contract
//! from memory. Used by embedders that already have their tasks loaded and by
//! the test suites.

use std::collections::{BTreeSet, HashMap};

use crate::accessor::{collect_tags, require, TaskAccessor};
use crate::error::{CoreError, Result, ValidationError};
use crate::storage::WorkflowConfig;
use crate::task::{Task, TaskId};

/// Task store backed by a `HashMap` plus an insertion-order index.
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    tasks: HashMap<TaskId, Task>,
    order: Vec<TaskId>,
    workflow: WorkflowConfig,
}

impl MemoryTaskStore {
    /// Create an empty store using the default workflow keywords.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with custom workflow keywords.
    pub fn with_workflow(workflow: WorkflowConfig) -> Self {
        Self {
            workflow,
            ..Self::default()
        }
    }

    /// Add a task.
    ///
    /// # Errors
    /// Returns [`ValidationError::DuplicateTask`] if the identifier is taken,
    /// or the validation error from [`Task::validate`].
    pub fn insert(&mut self, task: Task) -> Result<()> {
        task.validate()?;
        if self.tasks.contains_key(&task.id) {
            return Err(ValidationError::DuplicateTask(task.id).into());
        }
        self.order.push(task.id.clone());
        self.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    /// Replace an existing task, keeping its position.
    pub fn update(&mut self, task: Task) -> Result<()> {
        task.validate()?;
        let slot = self
            .tasks
            .get_mut(&task.id)
            .ok_or_else(|| CoreError::TaskNotFound(task.id.clone()))?;
        *slot = task;
        Ok(())
    }

    /// Remove a task, returning it.
    pub fn remove(&mut self, id: &str) -> Result<Task> {
        let task = require(self.tasks.remove(id), id)?;
        self.order.retain(|existing| existing != id);
        Ok(task)
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn task_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .get_mut(id)
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))
    }
}

impl FromIterator<Task> for MemoryTaskStore {
    /// Later tasks with a repeated identifier replace earlier ones.
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        let mut store = Self::new();
        for task in iter {
            if store.tasks.contains_key(&task.id) {
                store.tasks.insert(task.id.clone(), task);
            } else {
                store.order.push(task.id.clone());
                store.tasks.insert(task.id.clone(), task);
            }
        }
        store
    }
}

impl TaskAccessor for MemoryTaskStore {
    fn resolve_task(&self, id: &str) -> Result<Task> {
        require(self.tasks.get(id).cloned(), id)
    }

    fn property(&self, id: &str, name: &str) -> Result<Option<String>> {
        let task = require(self.tasks.get(id).cloned(), id)?;
        Ok(task.properties.get(name).cloned())
    }

    fn set_property(&mut self, id: &str, name: &str, value: &str) -> Result<()> {
        self.task_mut(id)?
            .properties
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_property(&mut self, id: &str, name: &str) -> Result<()> {
        self.task_mut(id)?.properties.remove(name);
        Ok(())
    }

    fn is_actionable_not_done(&self, id: &str) -> Result<bool> {
        let task = require(self.tasks.get(id).cloned(), id)?;
        Ok(self.workflow.is_actionable_not_done(task.state.as_deref()))
    }

    fn tags(&self, id: &str, include_inherited: bool) -> Result<BTreeSet<String>> {
        let task = require(self.tasks.get(id).cloned(), id)?;
        collect_tags(&task, include_inherited, |ancestor| {
            Ok(self.tasks.get(ancestor).cloned())
        })
    }

    fn task_ids(&self) -> Result<Vec<TaskId>> {
        Ok(self.order.clone())
    }
}

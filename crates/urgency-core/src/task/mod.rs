//! Typed task record consumed by the urgency engine.
//!
//! A task carries the attributes the trait evaluators read (priority letter,
//! deadline, workflow state, creation time, tags, blocking parents) plus a bag
//! of named properties where hosts persist derived values such as the cached
//! urgency score.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ValidationError;

/// Stable task identifier.
pub type TaskId = String;

/// A task in the list.
///
/// Every scoring input is optional; absent data degrades to a zero
/// contribution rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Workflow keyword such as `TODO`, `NEXT` or `DONE`.
    #[serde(default)]
    pub state: Option<String>,
    /// Priority letter (`A`, `B`, `C`, ...).
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    /// Reference timestamp the age trait counts from.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Own tags, without inherited ones.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Enclosing task in the outline; tags are inherited along this chain.
    #[serde(default)]
    pub outline_parent: Option<TaskId>,
    /// Tasks blocking this one, in declaration order.
    #[serde(default)]
    pub parents: Vec<TaskId>,
    /// Tasks this one blocks.
    #[serde(default)]
    pub children: Vec<TaskId>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Task {
    /// Create a bare task with no scoring attributes set.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            state: None,
            priority: None,
            deadline: None,
            created_at: None,
            tags: Vec::new(),
            outline_parent: None,
            parents: Vec::new(),
            children: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_outline_parent(mut self, parent: impl Into<TaskId>) -> Self {
        self.outline_parent = Some(parent.into());
        self
    }

    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Check the fields a store relies on.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidValue`] for an empty id or title, or a
    /// priority that is not a single token.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "id".into(),
                message: "must not be empty".into(),
            });
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "title".into(),
                message: "must not be empty".into(),
            });
        }
        if let Some(p) = &self.priority {
            if p.is_empty() || p.chars().any(char::is_whitespace) {
                return Err(ValidationError::InvalidValue {
                    field: "priority".into(),
                    message: format!("'{p}' is not a priority letter"),
                });
            }
        }
        Ok(())
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// Split a tag string such as `:work:next:` or `work, next` into tag names.
///
/// Empty segments are dropped; surrounding whitespace is trimmed.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split([':', ','])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a whitespace- or comma-separated list of task identifiers.
pub fn parse_ids(raw: &str) -> Vec<TaskId> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

//! Urgency scoring engine.
//!
//! Combines the six trait evaluators into a total score, memoizes that score
//! in a task property, and orders tasks by it.
//!
//! ## Cache semantics
//!
//! [`UrgencyEngine::get_urgency_score`] returns the stored score whenever one
//! exists, even if the task changed since it was written. Only
//! [`UrgencyEngine::update_urgency_score`] (or [`UrgencyEngine::refresh_all`])
//! recomputes. A stored value that does not parse as a finite number is an
//! error, never a silent recompute.
//!
//! Reading and then writing the score property is not atomic; callers sharing
//! a store across threads must serialize access themselves.

pub mod breakdown;
pub mod order;
pub mod traits;

pub use breakdown::{Breakdown, TraitKind, TraitTerm};
pub use order::compare_scores;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::accessor::TaskAccessor;
use crate::error::{CoreError, Result};
use crate::storage::UrgencyConfig;

/// Urgency engine bound to one configuration and one evaluation time.
#[derive(Debug, Clone)]
pub struct UrgencyEngine {
    config: UrgencyConfig,
    current_time: DateTime<Utc>,
}

impl Default for UrgencyEngine {
    fn default() -> Self {
        Self::new(UrgencyConfig::default())
    }
}

impl UrgencyEngine {
    /// Create an engine that evaluates time-dependent traits against `Utc::now()`.
    pub fn new(config: UrgencyConfig) -> Self {
        Self {
            config,
            current_time: Utc::now(),
        }
    }

    /// Evaluate deadline and age against a fixed moment instead of the clock.
    pub fn with_current_time(mut self, now: DateTime<Utc>) -> Self {
        self.current_time = now;
        self
    }

    pub fn config(&self) -> &UrgencyConfig {
        &self.config
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.current_time
    }

    /// Evaluate every trait for a task, bypassing the cache.
    ///
    /// # Errors
    /// Returns [`CoreError::TaskNotFound`] if `id` does not resolve.
    pub fn breakdown<A>(&self, store: &A, id: &str) -> Result<Breakdown>
    where
        A: TaskAccessor + ?Sized,
    {
        let task = store.resolve_task(id)?;
        let now = self.current_time;
        let mut breakdown = Breakdown::new(task.id.clone(), now);

        breakdown.extend(traits::priority(&self.config, &task));
        breakdown.extend(traits::deadline(&self.config, &task, now));
        breakdown.add_term(traits::activity(&self.config, &task));
        breakdown.extend(traits::age(&self.config, &task, now));

        let tags = store.tags(&task.id, true)?;
        breakdown.extend(traits::tags(&self.config, &tags));
        breakdown.extend(traits::blocking(&self.config, store, &task)?);

        Ok(breakdown)
    }

    /// Total urgency score of a task, bypassing the cache.
    pub fn compute_score<A>(&self, store: &A, id: &str) -> Result<f64>
    where
        A: TaskAccessor + ?Sized,
    {
        Ok(self.breakdown(store, id)?.total_score)
    }

    /// Render the breakdown table for a task from fresh values.
    pub fn describe<A>(&self, store: &A, id: &str) -> Result<String>
    where
        A: TaskAccessor + ?Sized,
    {
        Ok(self.breakdown(store, id)?.to_table())
    }

    /// Read the stored score without computing anything.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidCachedScore`] if the stored value is not a
    /// finite number.
    pub fn cached_score<A>(&self, store: &A, id: &str) -> Result<Option<f64>>
    where
        A: TaskAccessor + ?Sized,
    {
        let Some(raw) = store.property(id, &self.config.score_property)? else {
            return Ok(None);
        };
        match raw.trim().parse::<f64>() {
            Ok(score) if score.is_finite() => Ok(Some(score)),
            _ => Err(CoreError::InvalidCachedScore {
                task_id: id.to_string(),
                value: raw,
            }),
        }
    }

    /// Stored score if present, otherwise compute, store and return it.
    pub fn get_urgency_score<A>(&self, store: &mut A, id: &str) -> Result<f64>
    where
        A: TaskAccessor + ?Sized,
    {
        if let Some(score) = self.cached_score(store, id)? {
            debug!(task = %id, score, "urgency cache hit");
            return Ok(score);
        }
        debug!(task = %id, "urgency cache miss");
        self.update_urgency_score(store, id)
    }

    /// Recompute and store the score unconditionally.
    pub fn update_urgency_score<A>(&self, store: &mut A, id: &str) -> Result<f64>
    where
        A: TaskAccessor + ?Sized,
    {
        let score = self.compute_score(store, id)?;
        store.set_property(id, &self.config.score_property, &score.to_string())?;
        debug!(task = %id, score, "urgency score stored");
        Ok(score)
    }

    /// Drop the stored score so the next read recomputes it.
    pub fn clear_urgency_score<A>(&self, store: &mut A, id: &str) -> Result<()>
    where
        A: TaskAccessor + ?Sized,
    {
        store.remove_property(id, &self.config.score_property)
    }

    /// Recompute and store the score of every task the store enumerates.
    ///
    /// Returns the number of tasks refreshed.
    pub fn refresh_all<A>(&self, store: &mut A) -> Result<usize>
    where
        A: TaskAccessor + ?Sized,
    {
        let ids = store.task_ids()?;
        for id in &ids {
            self.update_urgency_score(store, id)?;
        }
        info!(count = ids.len(), "refreshed urgency scores");
        Ok(ids.len())
    }
}

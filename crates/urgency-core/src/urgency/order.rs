//! Ordering tasks by urgency.
//!
//! Higher scores sort first; equal scores compare as `Equal`, so a stable
//! sort keeps tied tasks in their input order.

use std::cmp::Ordering;

use super::UrgencyEngine;
use crate::accessor::TaskAccessor;
use crate::error::Result;
use crate::task::TaskId;

/// Descending comparison of two urgency scores.
pub fn compare_scores(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

impl UrgencyEngine {
    /// Compare two tasks by urgency, computing and caching missing scores.
    ///
    /// `Less` means `a` is more urgent and sorts first.
    pub fn compare<A>(&self, store: &mut A, a: &str, b: &str) -> Result<Ordering>
    where
        A: TaskAccessor + ?Sized,
    {
        let score_a = self.get_urgency_score(store, a)?;
        let score_b = self.get_urgency_score(store, b)?;
        Ok(compare_scores(score_a, score_b))
    }

    /// Stable-sort task identifiers by descending urgency.
    ///
    /// Every score is resolved (and cached) before sorting, so a failure for
    /// any task leaves `ids` untouched.
    pub fn sort_by_urgency<A>(&self, store: &mut A, ids: &mut [TaskId]) -> Result<()>
    where
        A: TaskAccessor + ?Sized,
    {
        let mut scored = Vec::with_capacity(ids.len());
        for id in ids.iter() {
            scored.push((self.get_urgency_score(store, id)?, id.clone()));
        }
        scored.sort_by(|(a, _), (b, _)| compare_scores(*a, *b));
        for (slot, (_, id)) in ids.iter_mut().zip(scored) {
            *slot = id;
        }
        Ok(())
    }

    /// Every task the store knows, most urgent first, with its score.
    pub fn ranked<A>(&self, store: &mut A) -> Result<Vec<(TaskId, f64)>>
    where
        A: TaskAccessor + ?Sized,
    {
        let mut ranked = Vec::new();
        for id in store.task_ids()? {
            let score = self.get_urgency_score(store, &id)?;
            ranked.push((id, score));
        }
        ranked.sort_by(|(_, a), (_, b)| compare_scores(*a, *b));
        Ok(ranked)
    }
}

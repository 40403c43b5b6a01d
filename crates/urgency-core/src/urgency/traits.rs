//! Trait evaluators.
//!
//! Each evaluator maps one dimension of a task onto zero or more
//! [`TraitTerm`]s of `(coefficient, normalized value, raw detail)`. They are
//! stateless: configuration and "now" are passed in, and the only host access
//! is the one-hop blocking lookup.
//!
//! | Trait    | Coefficient            | Value                         |
//! |----------|------------------------|-------------------------------|
//! | Priority | 1.0                    | `priority_scores[letter]`     |
//! | Deadline | `deadline_coefficient` | [`scaled_deadline`]           |
//! | Activity | `activity_coefficient` | 1.0 if active, else 0.0       |
//! | Age      | `age_coefficient`      | [`scaled_age`]                |
//! | Tag      | per-tag score          | 1.0 per tag                   |
//! | Blocking | `blocking_coefficient` | 1.0 per not-done parent       |

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::debug;

use super::breakdown::{TraitKind, TraitTerm};
use crate::accessor::TaskAccessor;
use crate::error::{CoreError, Result};
use crate::storage::UrgencyConfig;
use crate::task::Task;

/// Whole calendar days from `moment` to `now`, positive when `moment` is in the past.
pub fn days_since(now: DateTime<Utc>, moment: DateTime<Utc>) -> i64 {
    (now.date_naive() - moment.date_naive()).num_days()
}

/// Normalize a deadline distance (positive = overdue) into `[0.2, 1.0]`.
///
/// Overdue by a week or more saturates at 1.0; more than two weeks of lead
/// time bottoms out at 0.2; in between the value is linear.
pub fn scaled_deadline(distance_days: f64) -> f64 {
    if distance_days >= 7.0 {
        1.0
    } else if distance_days >= -14.0 {
        ((distance_days + 14.0) * 0.8 / 21.0) + 0.2
    } else {
        0.2
    }
}

/// Normalize an age in days into `[0.0, 1.0]`, saturating at `max_age_days`.
pub fn scaled_age(age_days: f64, max_age_days: u32) -> f64 {
    (age_days / f64::from(max_age_days.max(1))).clamp(0.0, 1.0)
}

pub fn priority(config: &UrgencyConfig, task: &Task) -> Option<TraitTerm> {
    let letter = task.priority.as_deref()?;
    Some(TraitTerm::new(
        TraitKind::Priority,
        "Priority",
        1.0,
        config.priority_score(letter),
        Some(format!("({letter})")),
    ))
}

pub fn deadline(config: &UrgencyConfig, task: &Task, now: DateTime<Utc>) -> Option<TraitTerm> {
    let deadline = task.deadline?;
    let distance = days_since(now, deadline) as f64;
    Some(TraitTerm::new(
        TraitKind::Deadline,
        "Deadline",
        config.deadline_coefficient,
        scaled_deadline(distance),
        Some(deadline.format("<%Y-%m-%d %a>").to_string()),
    ))
}

/// Active means any workflow keyword other than the configured inactive one.
/// A task without a keyword is inactive.
pub fn activity(config: &UrgencyConfig, task: &Task) -> TraitTerm {
    let active = task
        .state
        .as_deref()
        .is_some_and(|state| state != config.inactive_state);
    TraitTerm::new(
        TraitKind::Activity,
        "Activity",
        config.activity_coefficient,
        if active { 1.0 } else { 0.0 },
        Some(if active { "(active)" } else { "(inactive)" }.to_string()),
    )
}

/// Depends on `now`: the same task scores higher as time passes.
pub fn age(config: &UrgencyConfig, task: &Task, now: DateTime<Utc>) -> Option<TraitTerm> {
    let created_at = task.created_at?;
    let age_days = days_since(now, created_at);
    Some(TraitTerm::new(
        TraitKind::Age,
        "Age",
        config.age_coefficient,
        scaled_age(age_days as f64, config.max_age_days),
        Some(format!("({age_days}d)")),
    ))
}

/// One term per tag; an empty set yields no terms.
pub fn tags(config: &UrgencyConfig, tags: &BTreeSet<String>) -> Vec<TraitTerm> {
    tags.iter()
        .map(|tag| {
            TraitTerm::new(
                TraitKind::Tag,
                format!("Tag :{tag}:"),
                config.tag_score(tag),
                1.0,
                None,
            )
        })
        .collect()
}

/// One term per blocking parent that is still actionable and not done.
///
/// Parents are looked up one hop deep. An identifier that does not resolve
/// contributes nothing.
pub fn blocking<A>(config: &UrgencyConfig, store: &A, task: &Task) -> Result<Vec<TraitTerm>>
where
    A: TaskAccessor + ?Sized,
{
    let mut terms = Vec::new();
    for parent_id in &task.parents {
        let open = match store.is_actionable_not_done(parent_id) {
            Ok(open) => open,
            Err(CoreError::TaskNotFound(_)) => {
                debug!(task = %task.id, parent = %parent_id, "blocking parent does not resolve");
                false
            }
            Err(e) => return Err(e),
        };
        if open {
            terms.push(TraitTerm::new(
                TraitKind::Blocking,
                format!("Blocking {parent_id}"),
                config.blocking_coefficient,
                1.0,
                None,
            ));
        }
    }
    Ok(terms)
}

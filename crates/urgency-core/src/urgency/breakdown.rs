//! Per-trait score breakdown and its table rendering.
//!
//! The aggregator and the description formatter share [`Breakdown`]: the
//! total shown in the table is the same sum the cache stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scored dimension a term belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraitKind {
    Priority,
    Deadline,
    Activity,
    Age,
    Tag,
    Blocking,
}

impl TraitKind {
    pub const ALL: [TraitKind; 6] = [
        TraitKind::Priority,
        TraitKind::Deadline,
        TraitKind::Activity,
        TraitKind::Age,
        TraitKind::Tag,
        TraitKind::Blocking,
    ];
}

/// One row of a breakdown: `score = coefficient * value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitTerm {
    pub kind: TraitKind,
    /// Row label, e.g. `Priority` or `Tag :next:`.
    pub label: String,
    pub coefficient: f64,
    /// Normalized value the coefficient multiplies.
    pub value: f64,
    /// Raw input shown next to the value, e.g. `(A)` or `<2024-05-01 Wed>`.
    pub detail: Option<String>,
    pub score: f64,
}

impl TraitTerm {
    pub fn new(
        kind: TraitKind,
        label: impl Into<String>,
        coefficient: f64,
        value: f64,
        detail: Option<String>,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            coefficient,
            value,
            detail,
            score: coefficient * value,
        }
    }

    fn coefficient_cell(&self) -> String {
        match self.kind {
            TraitKind::Priority => format!("{:.1}", self.coefficient),
            _ => format!("{:.2}", self.coefficient),
        }
    }

    fn value_cell(&self) -> String {
        let value = match self.kind {
            TraitKind::Tag | TraitKind::Blocking => format!("{:.1}", self.value),
            _ => format!("{:.2}", self.value),
        };
        match &self.detail {
            Some(detail) => format!("{value} {detail}"),
            None => value,
        }
    }
}

impl fmt::Display for TraitTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "| {} | {} | {} | {:.2} |",
            self.label,
            self.coefficient_cell(),
            self.value_cell(),
            self.score
        )
    }
}

/// Complete urgency breakdown for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub task_id: String,
    pub terms: Vec<TraitTerm>,
    pub total_score: f64,
    /// The "now" the time-dependent traits were evaluated against.
    pub scored_at: DateTime<Utc>,
}

impl Breakdown {
    pub fn new(task_id: impl Into<String>, scored_at: DateTime<Utc>) -> Self {
        Self {
            task_id: task_id.into(),
            terms: Vec::new(),
            total_score: 0.0,
            scored_at,
        }
    }

    /// Add a term to the breakdown
    pub fn add_term(&mut self, term: TraitTerm) {
        self.total_score += term.score;
        self.terms.push(term);
    }

    pub fn extend<I: IntoIterator<Item = TraitTerm>>(&mut self, terms: I) {
        for term in terms {
            self.add_term(term);
        }
    }

    /// Sum of all terms of one kind; 0 when the trait produced no rows.
    pub fn trait_score(&self, kind: TraitKind) -> f64 {
        self.terms
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.score)
            .sum()
    }

    /// Render the breakdown as a table, one row per term plus a total row.
    pub fn to_table(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Breakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "| Property | Coefficient | Value | Score |")?;
        writeln!(f, "|-")?;
        for term in &self.terms {
            writeln!(f, "{term}")?;
        }
        writeln!(f, "|-")?;
        write!(f, "| Total | | | {:.2} |", self.total_score)
    }
}

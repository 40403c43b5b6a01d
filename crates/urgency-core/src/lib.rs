//! # Urgency Core Library
//!
//! Computes a single urgency score per task so a task list can be sorted by
//! how urgently each item demands attention.
//!
//! ## Architecture
//!
//! - **Task Accessor**: the [`TaskAccessor`] trait is the only way the engine
//!   reads or writes tasks. [`MemoryTaskStore`] and the SQLite-backed
//!   [`TaskDb`] implement it.
//! - **Trait Evaluators**: priority, deadline, activity, age, tags and
//!   blocking, each producing `(coefficient, value, detail)` terms
//! - **Aggregator and Cache**: [`UrgencyEngine`] sums the terms and memoizes
//!   the total in a task property until explicitly refreshed
//! - **Ordering**: descending-score comparison suitable for a stable sort
//! - **Breakdown**: the per-trait table behind a score
//!
//! ## Key Components
//!
//! - [`UrgencyEngine`]: scoring, caching and ordering
//! - [`Breakdown`]: explainable per-trait result
//! - [`Config`]: TOML configuration with coefficients and workflow keywords

pub mod accessor;
pub mod error;
pub mod storage;
pub mod task;
pub mod urgency;

pub use accessor::TaskAccessor;
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use storage::{Config, MemoryTaskStore, TaskDb, UrgencyConfig, WorkflowConfig};
pub use task::{Task, TaskId};
pub use urgency::{compare_scores, Breakdown, TraitKind, TraitTerm, UrgencyEngine};

//! Urgency scoring commands for CLI.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::Serialize;
use urgency_core::{Config, TaskAccessor};

use super::{engine, open_db, parse_when};

#[derive(Subcommand)]
pub enum UrgencyAction {
    /// Print a task's urgency score, computing and caching it if unset
    Score {
        /// Task ID
        id: String,
    },
    /// Recompute and store a task's urgency score
    Refresh {
        /// Task ID
        id: String,
        /// Evaluate as of this moment instead of now
        #[arg(long, value_parser = parse_when)]
        at: Option<DateTime<Utc>>,
    },
    /// Recompute and store every task's urgency score
    RefreshAll {
        /// Evaluate as of this moment instead of now
        #[arg(long, value_parser = parse_when)]
        at: Option<DateTime<Utc>>,
    },
    /// Remove a task's stored urgency score
    Clear {
        /// Task ID
        id: String,
    },
    /// Show the per-trait breakdown behind a task's score
    Explain {
        /// Task ID
        id: String,
        /// Evaluate as of this moment instead of now
        #[arg(long, value_parser = parse_when)]
        at: Option<DateTime<Utc>>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List open tasks, most urgent first
    Agenda {
        /// Include tasks that are done or have no workflow keyword
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct AgendaEntry {
    id: String,
    title: String,
    state: Option<String>,
    score: f64,
}

pub fn run(action: UrgencyAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut db = open_db(&config)?;

    match action {
        UrgencyAction::Score { id } => {
            let score = engine(&config, None).get_urgency_score(&mut db, &id)?;
            println!("{score:.2}");
        }
        UrgencyAction::Refresh { id, at } => {
            let score = engine(&config, at).update_urgency_score(&mut db, &id)?;
            println!("{score:.2}");
        }
        UrgencyAction::RefreshAll { at } => {
            let count = engine(&config, at).refresh_all(&mut db)?;
            println!("Refreshed {count} tasks");
        }
        UrgencyAction::Clear { id } => {
            engine(&config, None).clear_urgency_score(&mut db, &id)?;
            println!("Cleared urgency score: {id}");
        }
        UrgencyAction::Explain { id, at, json } => {
            let breakdown = engine(&config, at).breakdown(&db, &id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&breakdown)?);
            } else {
                println!("{breakdown}");
            }
        }
        UrgencyAction::Agenda { all, json } => {
            let engine = engine(&config, None);
            let mut ids = db.task_ids()?;
            if !all {
                let mut open = Vec::with_capacity(ids.len());
                for id in ids {
                    if db.is_actionable_not_done(&id)? {
                        open.push(id);
                    }
                }
                ids = open;
            }
            engine.sort_by_urgency(&mut db, &mut ids)?;

            let mut entries = Vec::with_capacity(ids.len());
            for id in ids {
                let score = engine.get_urgency_score(&mut db, &id)?;
                let task = db.resolve_task(&id)?;
                entries.push(AgendaEntry {
                    id,
                    title: task.title,
                    state: task.state,
                    score,
                });
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in &entries {
                    println!(
                        "{:>7.2}  {:<8} {}  [{}]",
                        entry.score,
                        entry.state.as_deref().unwrap_or(""),
                        entry.title,
                        entry.id
                    );
                }
            }
        }
    }
    Ok(())
}

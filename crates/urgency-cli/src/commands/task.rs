//! Task management commands for CLI.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use urgency_core::task::{parse_ids, parse_tags};
use urgency_core::{Config, CoreError, Task};
use uuid::Uuid;

use super::{open_db, parse_when};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        /// Task ID (default: random UUID)
        #[arg(long)]
        id: Option<String>,
        /// Workflow keyword, e.g. TODO or NEXT
        #[arg(long, default_value = "TODO")]
        state: String,
        /// Priority letter
        #[arg(long)]
        priority: Option<String>,
        /// Deadline (YYYY-MM-DD or RFC3339)
        #[arg(long, value_parser = parse_when)]
        deadline: Option<DateTime<Utc>>,
        /// Creation timestamp (default: now)
        #[arg(long, value_parser = parse_when)]
        created: Option<DateTime<Utc>>,
        /// Tags, comma- or colon-separated
        #[arg(long)]
        tags: Option<String>,
        /// Enclosing task whose tags are inherited
        #[arg(long)]
        parent: Option<String>,
        /// IDs of tasks blocking this one
        #[arg(long)]
        blocked_by: Option<String>,
    },
    /// List tasks as JSON
    List {
        /// Filter by workflow keyword
        #[arg(long)]
        state: Option<String>,
        /// Filter by tag (own tags only)
        #[arg(long)]
        tag: Option<String>,
    },
    /// Show task details
    Show {
        /// Task ID
        id: String,
    },
    /// Update a task
    Set {
        /// Task ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New workflow keyword
        #[arg(long)]
        state: Option<String>,
        /// New priority letter ("-" clears it)
        #[arg(long)]
        priority: Option<String>,
        /// New deadline
        #[arg(long, value_parser = parse_when)]
        deadline: Option<DateTime<Utc>>,
        /// Remove the deadline
        #[arg(long, conflicts_with = "deadline")]
        clear_deadline: bool,
        /// Replace tags
        #[arg(long)]
        tags: Option<String>,
        /// Replace blocking tasks
        #[arg(long)]
        blocked_by: Option<String>,
    },
    /// Mark a task done
    Done {
        /// Task ID
        id: String,
    },
    /// Add a blocking task
    Block {
        /// Task ID
        id: String,
        /// ID of the task that blocks it
        blocker: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = open_db(&config)?;

    match action {
        TaskAction::Add {
            title,
            id,
            state,
            priority,
            deadline,
            created,
            tags,
            parent,
            blocked_by,
        } => {
            let mut task = Task::new(id.unwrap_or_else(|| Uuid::new_v4().to_string()), title)
                .with_state(state)
                .with_created_at(created.unwrap_or_else(Utc::now));
            task.priority = priority;
            task.deadline = deadline;
            task.tags = tags.as_deref().map(parse_tags).unwrap_or_default();
            task.outline_parent = parent;
            task.parents = blocked_by.as_deref().map(parse_ids).unwrap_or_default();

            db.create_task(&task)?;
            println!("Task created: {}", task.id);
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List { state, tag } => {
            let filtered: Vec<_> = db
                .list_tasks()?
                .into_iter()
                .filter(|task| {
                    if let Some(ref s) = state {
                        if task.state.as_ref() != Some(s) {
                            return false;
                        }
                    }
                    if let Some(ref t) = tag {
                        if !task.tags.contains(t) {
                            return false;
                        }
                    }
                    true
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&filtered)?);
        }
        TaskAction::Show { id } => {
            let task = db.get_task(&id)?.ok_or(CoreError::TaskNotFound(id))?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::Set {
            id,
            title,
            state,
            priority,
            deadline,
            clear_deadline,
            tags,
            blocked_by,
        } => {
            let mut task = db
                .get_task(&id)?
                .ok_or_else(|| CoreError::TaskNotFound(id.clone()))?;

            if let Some(t) = title { task.title = t; }
            if let Some(s) = state { task.state = Some(s); }
            if let Some(p) = priority {
                task.priority = if p == "-" { None } else { Some(p) };
            }
            if let Some(d) = deadline { task.deadline = Some(d); }
            if clear_deadline { task.deadline = None; }
            if let Some(t) = tags { task.tags = parse_tags(&t); }
            if let Some(b) = blocked_by { task.parents = parse_ids(&b); }

            db.update_task(&task)?;
            println!("Task updated:");
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::Done { id } => {
            let done = config
                .workflow
                .done_keywords
                .first()
                .map(String::as_str)
                .unwrap_or("DONE");
            db.set_state(&id, Some(done))?;
            println!("Task {id} marked {done}");
        }
        TaskAction::Block { id, blocker } => {
            db.add_blocker(&id, &blocker)?;
            println!("Task {id} blocked by {blocker}");
        }
        TaskAction::Delete { id } => {
            db.delete_task(&id)?;
            println!("Task deleted: {id}");
        }
    }
    Ok(())
}

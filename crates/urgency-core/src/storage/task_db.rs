//! SQLite-based task storage.
//!
//! Provides persistent storage for:
//! - Task records (state, priority, deadline, creation time, outline parent)
//! - Own tags per task
//! - Blocking links (`task_id` is blocked by `parent_id`), keyed by position so
//!   a repeated parent survives a round trip
//! - Named task properties, including the cached urgency score
//!
//! `children` is never stored; it is derived from the blocking links on load.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::{data_dir, WorkflowConfig};
use crate::accessor::{collect_tags, require, TaskAccessor};
use crate::error::{CoreError, DatabaseError, Result, ValidationError};
use crate::task::{Task, TaskId};

// === Helper Functions ===

/// Parse an optional RFC3339 column, reporting malformed values as conversion failures.
fn parse_datetime_column(
    column: usize,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        column,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
        })
        .transpose()
}

/// Build a Task from a `tasks` row, without tags, links or properties.
fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
    let deadline = parse_datetime_column(4, row.get(4)?)?;
    let created_at = parse_datetime_column(5, row.get(5)?)?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        state: row.get(2)?,
        priority: row.get(3)?,
        deadline,
        created_at,
        tags: Vec::new(),
        outline_parent: row.get(6)?,
        parents: Vec::new(),
        children: Vec::new(),
        properties: BTreeMap::new(),
    })
}

const TASK_COLUMNS: &str = "id, title, state, priority, deadline, created_at, outline_parent";

/// SQLite database for task storage.
pub struct TaskDb {
    conn: Connection,
    workflow: WorkflowConfig,
}

impl TaskDb {
    /// Open the task database at `<data dir>/urgency.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("urgency.db");
        Self::open_path(&path)
    }

    /// Open the task database at an explicit path.
    pub fn open_path(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn,
            workflow: WorkflowConfig::default(),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            workflow: WorkflowConfig::default(),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Use custom workflow keywords for `is_actionable_not_done`.
    pub fn with_workflow(mut self, workflow: WorkflowConfig) -> Self {
        self.workflow = workflow;
        self
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id             TEXT PRIMARY KEY,
                title          TEXT NOT NULL,
                state          TEXT,
                priority       TEXT,
                deadline       TEXT,
                created_at     TEXT,
                outline_parent TEXT,
                position       INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS task_tags (
                task_id TEXT NOT NULL,
                tag     TEXT NOT NULL,
                PRIMARY KEY (task_id, tag)
            );

            CREATE TABLE IF NOT EXISTS task_links (
                task_id   TEXT NOT NULL,
                parent_id TEXT NOT NULL,
                position  INTEGER NOT NULL,
                PRIMARY KEY (task_id, position)
            );

            CREATE TABLE IF NOT EXISTS task_properties (
                task_id TEXT NOT NULL,
                name    TEXT NOT NULL,
                value   TEXT NOT NULL,
                PRIMARY KEY (task_id, name)
            );

            CREATE INDEX IF NOT EXISTS idx_task_links_parent ON task_links(parent_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_outline_parent ON tasks(outline_parent);",
        )?;
        Ok(())
    }

    /// Run `f` inside an immediate transaction, rolling back on error.
    fn transaction<T>(
        &self,
        f: impl FnOnce() -> Result<T, rusqlite::Error>,
    ) -> Result<T, rusqlite::Error> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        match f() {
            Ok(value) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }

    fn write_relations(&self, task: &Task) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM task_tags WHERE task_id = ?1", params![task.id])?;
        for tag in &task.tags {
            self.conn.execute(
                "INSERT OR IGNORE INTO task_tags (task_id, tag) VALUES (?1, ?2)",
                params![task.id, tag],
            )?;
        }

        self.conn
            .execute("DELETE FROM task_links WHERE task_id = ?1", params![task.id])?;
        for (position, parent_id) in task.parents.iter().enumerate() {
            self.conn.execute(
                "INSERT INTO task_links (task_id, parent_id, position) VALUES (?1, ?2, ?3)",
                params![task.id, parent_id, position as i64],
            )?;
        }

        self.conn.execute(
            "DELETE FROM task_properties WHERE task_id = ?1",
            params![task.id],
        )?;
        for (name, value) in &task.properties {
            self.conn.execute(
                "INSERT INTO task_properties (task_id, name, value) VALUES (?1, ?2, ?3)",
                params![task.id, name, value],
            )?;
        }
        Ok(())
    }

    fn load_relations(&self, task: &mut Task) -> Result<(), rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT tag FROM task_tags WHERE task_id = ?1 ORDER BY rowid")?;
        task.tags = stmt
            .query_map(params![task.id], |row| row.get::<_, String>(0))?
            .collect::<Result<_, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT parent_id FROM task_links WHERE task_id = ?1 ORDER BY position",
        )?;
        task.parents = stmt
            .query_map(params![task.id], |row| row.get::<_, String>(0))?
            .collect::<Result<_, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT task_id FROM task_links WHERE parent_id = ?1 ORDER BY task_id",
        )?;
        task.children = stmt
            .query_map(params![task.id], |row| row.get::<_, String>(0))?
            .collect::<Result<_, _>>()?;

        let mut stmt = self
            .conn
            .prepare("SELECT name, value FROM task_properties WHERE task_id = ?1")?;
        task.properties = stmt
            .query_map(params![task.id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    fn get_task_row(&self, id: &str) -> Result<Option<Task>, rusqlite::Error> {
        self.conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                row_to_task,
            )
            .optional()
    }

    fn exists(&self, id: &str) -> Result<bool, rusqlite::Error> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // === Task CRUD ===

    /// Create a new task.
    ///
    /// # Errors
    /// Returns [`ValidationError::DuplicateTask`] if the identifier is taken.
    pub fn create_task(&self, task: &Task) -> Result<()> {
        task.validate()?;
        if self.exists(&task.id)? {
            return Err(ValidationError::DuplicateTask(task.id.clone()).into());
        }
        self.transaction(|| {
            let position: i64 = self.conn.query_row(
                "SELECT COALESCE(MAX(position), 0) + 1 FROM tasks",
                [],
                |row| row.get(0),
            )?;
            self.conn.execute(
                "INSERT INTO tasks (id, title, state, priority, deadline, created_at, outline_parent, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    task.id,
                    task.title,
                    task.state,
                    task.priority,
                    task.deadline.map(|dt| dt.to_rfc3339()),
                    task.created_at.map(|dt| dt.to_rfc3339()),
                    task.outline_parent,
                    position,
                ],
            )?;
            self.write_relations(task)
        })?;
        Ok(())
    }

    /// Get a task by ID.
    pub fn get_task(&self, id: &str) -> Result<Option<Task>, rusqlite::Error> {
        match self.get_task_row(id)? {
            Some(mut task) => {
                self.load_relations(&mut task)?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    /// List all tasks in creation order.
    pub fn list_tasks(&self) -> Result<Vec<Task>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY position"))?;
        let mut tasks: Vec<Task> = stmt
            .query_map([], row_to_task)?
            .collect::<Result<_, _>>()?;
        for task in &mut tasks {
            self.load_relations(task)?;
        }
        Ok(tasks)
    }

    /// Update a task, replacing its tags, blocking links and properties.
    pub fn update_task(&self, task: &Task) -> Result<()> {
        task.validate()?;
        if !self.exists(&task.id)? {
            return Err(CoreError::TaskNotFound(task.id.clone()));
        }
        self.transaction(|| {
            self.conn.execute(
                "UPDATE tasks SET title = ?2, state = ?3, priority = ?4, deadline = ?5,
                        created_at = ?6, outline_parent = ?7
                 WHERE id = ?1",
                params![
                    task.id,
                    task.title,
                    task.state,
                    task.priority,
                    task.deadline.map(|dt| dt.to_rfc3339()),
                    task.created_at.map(|dt| dt.to_rfc3339()),
                    task.outline_parent,
                ],
            )?;
            self.write_relations(task)
        })?;
        Ok(())
    }

    /// Delete a task together with its tags, properties and links in either direction.
    pub fn delete_task(&self, id: &str) -> Result<()> {
        if !self.exists(id)? {
            return Err(CoreError::TaskNotFound(id.to_string()));
        }
        self.transaction(|| {
            self.conn
                .execute("DELETE FROM task_tags WHERE task_id = ?1", params![id])?;
            self.conn
                .execute("DELETE FROM task_properties WHERE task_id = ?1", params![id])?;
            self.conn.execute(
                "DELETE FROM task_links WHERE task_id = ?1 OR parent_id = ?1",
                params![id],
            )?;
            self.conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            Ok(())
        })?;
        Ok(())
    }

    /// Set the workflow keyword of a task.
    pub fn set_state(&self, id: &str, state: Option<&str>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET state = ?2 WHERE id = ?1",
            params![id, state],
        )?;
        if changed == 0 {
            return Err(CoreError::TaskNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Append a blocking parent to a task, keeping existing links.
    pub fn add_blocker(&self, id: &str, parent_id: &str) -> Result<()> {
        if !self.exists(id)? {
            return Err(CoreError::TaskNotFound(id.to_string()));
        }
        self.conn.execute(
            "INSERT INTO task_links (task_id, parent_id, position)
             SELECT ?1, ?2, COALESCE(MAX(position), -1) + 1 FROM task_links WHERE task_id = ?1",
            params![id, parent_id],
        )?;
        Ok(())
    }
}

impl TaskAccessor for TaskDb {
    fn resolve_task(&self, id: &str) -> Result<Task> {
        require(self.get_task(id)?, id)
    }

    fn property(&self, id: &str, name: &str) -> Result<Option<String>> {
        if !self.exists(id)? {
            return Err(CoreError::TaskNotFound(id.to_string()));
        }
        let value = self
            .conn
            .query_row(
                "SELECT value FROM task_properties WHERE task_id = ?1 AND name = ?2",
                params![id, name],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_property(&mut self, id: &str, name: &str, value: &str) -> Result<()> {
        if !self.exists(id)? {
            return Err(CoreError::TaskNotFound(id.to_string()));
        }
        self.conn.execute(
            "INSERT OR REPLACE INTO task_properties (task_id, name, value) VALUES (?1, ?2, ?3)",
            params![id, name, value],
        )?;
        Ok(())
    }

    fn remove_property(&mut self, id: &str, name: &str) -> Result<()> {
        if !self.exists(id)? {
            return Err(CoreError::TaskNotFound(id.to_string()));
        }
        self.conn.execute(
            "DELETE FROM task_properties WHERE task_id = ?1 AND name = ?2",
            params![id, name],
        )?;
        Ok(())
    }

    fn is_actionable_not_done(&self, id: &str) -> Result<bool> {
        let task = require(self.get_task_row(id)?, id)?;
        Ok(self.workflow.is_actionable_not_done(task.state.as_deref()))
    }

    fn tags(&self, id: &str, include_inherited: bool) -> Result<BTreeSet<String>> {
        let task = require(self.get_task(id)?, id)?;
        collect_tags(&task, include_inherited, |ancestor| {
            Ok(self.get_task(ancestor)?)
        })
    }

    fn task_ids(&self) -> Result<Vec<TaskId>> {
        let mut stmt = self.conn.prepare("SELECT id FROM tasks ORDER BY position")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

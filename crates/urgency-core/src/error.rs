//! Core error types for urgency-core.
//!
//! Missing task data never surfaces here: evaluators degrade to a zero
//! contribution instead. Errors are reserved for unresolvable tasks, corrupted
//! cached scores, and failures of the storage and configuration layers.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for urgency-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The requested task identifier does not resolve to a task
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// A persisted urgency score could not be parsed as a number
    #[error("Invalid cached urgency score for task '{task_id}': {value:?}")]
    InvalidCachedScore { task_id: String, value: String },

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Could not determine or create the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// A task with this identifier already exists
    #[error("Task already exists: {0}")]
    DuplicateTask(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked
                    || err.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_not_found_message_names_the_id() {
        let err = CoreError::TaskNotFound("abc".to_string());
        assert_eq!(err.to_string(), "Task not found: abc");
    }

    #[test]
    fn invalid_cached_score_quotes_the_value() {
        let err = CoreError::InvalidCachedScore {
            task_id: "t1".to_string(),
            value: "twelve".to_string(),
        };
        assert!(err.to_string().contains("\"twelve\""));
        assert!(err.to_string().contains("t1"));
    }

    #[test]
    fn rusqlite_errors_become_query_failures() {
        let err: CoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(
            err,
            CoreError::Database(DatabaseError::QueryFailed(_))
        ));
    }
}

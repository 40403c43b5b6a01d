pub mod config;
pub mod memory;
pub mod task_db;

pub use config::{Config, UrgencyConfig, WorkflowConfig};
pub use memory::MemoryTaskStore;
pub use task_db::TaskDb;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// Resolution order:
/// - `URGENCY_HOME`, used verbatim when set
/// - `~/.config/urgency-dev/` when `URGENCY_ENV=dev`
/// - `~/.config/urgency/` otherwise
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("URGENCY_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("URGENCY_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("urgency-dev")
            } else {
                base_dir.join("urgency")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

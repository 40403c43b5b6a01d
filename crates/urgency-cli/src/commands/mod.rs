pub mod config;
pub mod task;
pub mod urgency;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use urgency_core::{Config, TaskDb, UrgencyEngine};

/// Open the task database with the configured workflow keywords.
pub fn open_db(config: &Config) -> Result<TaskDb, Box<dyn std::error::Error>> {
    Ok(TaskDb::open()?.with_workflow(config.workflow.clone()))
}

/// Build an engine from the configured coefficients, evaluated at `now`.
pub fn engine(config: &Config, now: Option<DateTime<Utc>>) -> UrgencyEngine {
    let engine = UrgencyEngine::new(config.urgency.clone());
    match now {
        Some(now) => engine.with_current_time(now),
        None => engine,
    }
}

/// Parse `YYYY-MM-DD` (midnight UTC) or an RFC3339 timestamp.
pub fn parse_when(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| format!("expected YYYY-MM-DD or RFC3339 timestamp, got '{raw}'"))
}

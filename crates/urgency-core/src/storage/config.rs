//! TOML-based application configuration.
//!
//! Stores:
//! - Urgency coefficients and score tables
//! - The workflow keywords hosts use to tell open tasks from finished ones
//!
//! Configuration is stored at `~/.config/urgency/config.toml`. Changes only
//! affect scores computed after they are made; cached scores are left alone.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};

/// Coefficients and score tables used by the trait evaluators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgencyConfig {
    /// Score per priority letter. Letters not listed score 0.
    #[serde(default = "default_priority_scores")]
    pub priority_scores: BTreeMap<String, f64>,
    #[serde(default = "default_deadline_coefficient")]
    pub deadline_coefficient: f64,
    #[serde(default = "default_activity_coefficient")]
    pub activity_coefficient: f64,
    #[serde(default = "default_age_coefficient")]
    pub age_coefficient: f64,
    /// Age at which the age trait saturates.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
    #[serde(default = "default_blocking_coefficient")]
    pub blocking_coefficient: f64,
    /// Score for any tag without an entry in `tag_scores`.
    #[serde(default = "default_tag_score")]
    pub default_tag_score: f64,
    #[serde(default = "default_tag_scores")]
    pub tag_scores: BTreeMap<String, f64>,
    /// Workflow keyword of a task that has not been started. Any other
    /// keyword counts as active.
    #[serde(default = "default_inactive_state")]
    pub inactive_state: String,
    /// Name of the task property holding the cached score.
    #[serde(default = "default_score_property")]
    pub score_property: String,
}

/// Workflow keywords understood by the bundled task stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default = "default_todo_keywords")]
    pub todo_keywords: Vec<String>,
    #[serde(default = "default_done_keywords")]
    pub done_keywords: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/urgency/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub urgency: UrgencyConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

// Default functions
fn default_priority_scores() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("A".to_string(), 6.0),
        ("B".to_string(), 3.9),
        ("C".to_string(), 1.8),
    ])
}
fn default_deadline_coefficient() -> f64 {
    12.0
}
fn default_activity_coefficient() -> f64 {
    4.0
}
fn default_age_coefficient() -> f64 {
    2.0
}
fn default_max_age_days() -> u32 {
    365
}
fn default_blocking_coefficient() -> f64 {
    2.0
}
fn default_tag_score() -> f64 {
    1.0
}
fn default_tag_scores() -> BTreeMap<String, f64> {
    BTreeMap::from([("next".to_string(), 15.0)])
}
fn default_inactive_state() -> String {
    "TODO".into()
}
fn default_score_property() -> String {
    "URGENCY".into()
}
fn default_todo_keywords() -> Vec<String> {
    ["TODO", "NEXT", "STARTED", "WAITING"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_done_keywords() -> Vec<String> {
    ["DONE", "CANCELLED"].into_iter().map(String::from).collect()
}

impl Default for UrgencyConfig {
    fn default() -> Self {
        Self {
            priority_scores: default_priority_scores(),
            deadline_coefficient: default_deadline_coefficient(),
            activity_coefficient: default_activity_coefficient(),
            age_coefficient: default_age_coefficient(),
            max_age_days: default_max_age_days(),
            blocking_coefficient: default_blocking_coefficient(),
            default_tag_score: default_tag_score(),
            tag_scores: default_tag_scores(),
            inactive_state: default_inactive_state(),
            score_property: default_score_property(),
        }
    }
}

impl UrgencyConfig {
    /// Score configured for a priority letter, 0 when unlisted.
    pub fn priority_score(&self, letter: &str) -> f64 {
        self.priority_scores.get(letter).copied().unwrap_or(0.0)
    }

    /// Score configured for a tag, falling back to `default_tag_score`.
    pub fn tag_score(&self, tag: &str) -> f64 {
        self.tag_scores
            .get(tag)
            .copied()
            .unwrap_or(self.default_tag_score)
    }

    /// Reject settings that would break the non-negative trait invariant.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let coefficients = [
            ("urgency.deadline_coefficient", self.deadline_coefficient),
            ("urgency.activity_coefficient", self.activity_coefficient),
            ("urgency.age_coefficient", self.age_coefficient),
            ("urgency.blocking_coefficient", self.blocking_coefficient),
            ("urgency.default_tag_score", self.default_tag_score),
        ];
        let tables = self
            .priority_scores
            .iter()
            .map(|(k, v)| (format!("urgency.priority_scores.{k}"), *v))
            .chain(
                self.tag_scores
                    .iter()
                    .map(|(k, v)| (format!("urgency.tag_scores.{k}"), *v)),
            );

        for (key, value) in coefficients
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .chain(tables)
        {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    key,
                    message: format!("must be a non-negative number, got {value}"),
                });
            }
        }

        if self.max_age_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "urgency.max_age_days".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.score_property.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "urgency.score_property".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            todo_keywords: default_todo_keywords(),
            done_keywords: default_done_keywords(),
        }
    }
}

impl WorkflowConfig {
    /// Whether `state` is a not-yet-finished workflow keyword.
    pub fn is_actionable_not_done(&self, state: Option<&str>) -> bool {
        match state {
            Some(s) => {
                self.todo_keywords.iter().any(|k| k == s)
                    && !self.done_keywords.iter().any(|k| k == s)
            }
            None => false,
        }
    }
}

/// Map-valued sections that accept new keys through `set`.
const OPEN_TABLES: &[&str] = &["urgency.priority_scores", "urgency.tag_scores"];

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        let mut walked: Vec<&str> = Vec::new();
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let parent_path = walked.join(".");
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match obj.get(part) {
                    Some(serde_json::Value::Bool(_)) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    Some(serde_json::Value::Number(_)) => parse_number(value).map_err(invalid)?,
                    Some(serde_json::Value::Object(_)) | Some(serde_json::Value::Array(_)) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    Some(_) => serde_json::Value::String(value.into()),
                    None if OPEN_TABLES.contains(&parent_path.as_str()) => {
                        parse_number(value).map_err(invalid)?
                    }
                    None => return Err(ConfigError::UnknownKey(key.to_string())),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            walked.push(part);
            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.urgency.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is unchanged on error.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.urgency.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }
}

fn parse_number(value: &str) -> std::result::Result<serde_json::Value, String> {
    if let Ok(n) = value.parse::<u64>() {
        Ok(serde_json::Value::Number(n.into()))
    } else if let Ok(n) = value.parse::<f64>() {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .ok_or_else(|| format!("cannot parse '{value}' as number"))
    } else {
        Err(format!("cannot parse '{value}' as number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = UrgencyConfig::default();
        assert_eq!(cfg.priority_score("A"), 6.0);
        assert_eq!(cfg.priority_score("B"), 3.9);
        assert_eq!(cfg.priority_score("C"), 1.8);
        assert_eq!(cfg.priority_score("D"), 0.0);
        assert_eq!(cfg.deadline_coefficient, 12.0);
        assert_eq!(cfg.activity_coefficient, 4.0);
        assert_eq!(cfg.age_coefficient, 2.0);
        assert_eq!(cfg.max_age_days, 365);
        assert_eq!(cfg.blocking_coefficient, 2.0);
        assert_eq!(cfg.tag_score("next"), 15.0);
        assert_eq!(cfg.tag_score("anything"), 1.0);
        assert_eq!(cfg.inactive_state, "TODO");
        assert_eq!(cfg.score_property, "URGENCY");
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let parsed: Config = toml::from_str("[urgency]\nage_coefficient = 3.5\n").unwrap();
        assert_eq!(parsed.urgency.age_coefficient, 3.5);
        assert_eq!(parsed.urgency.deadline_coefficient, 12.0);
        assert_eq!(parsed.workflow, WorkflowConfig::default());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("urgency.inactive_state").as_deref(), Some("TODO"));
        assert_eq!(cfg.get("urgency.max_age_days").as_deref(), Some("365"));
        assert_eq!(cfg.get("urgency.tag_scores.next").as_deref(), Some("15.0"));
        assert!(cfg.get("urgency.missing_key").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "urgency.max_age_days", "30").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "urgency.max_age_days").unwrap(),
            &serde_json::Value::Number(30.into())
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "urgency.nonexistent", "1");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "urgency.age_coefficient", "lots");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn set_value_adds_new_tag_and_priority_entries() {
        let mut cfg = Config::default();
        cfg.set_value("urgency.tag_scores.waiting", "0").unwrap();
        cfg.set_value("urgency.priority_scores.D", "0.5").unwrap();
        assert_eq!(cfg.urgency.tag_score("waiting"), 0.0);
        assert_eq!(cfg.urgency.priority_score("D"), 0.5);
    }

    #[test]
    fn set_value_rejects_negative_coefficients_and_leaves_config_untouched() {
        let mut cfg = Config::default();
        let result = cfg.set_value("urgency.blocking_coefficient", "-2");
        assert!(result.is_err());
        assert_eq!(cfg.urgency.blocking_coefficient, 2.0);
    }

    #[test]
    fn set_value_replaces_workflow_lists_from_json() {
        let mut cfg = Config::default();
        cfg.set_value("workflow.done_keywords", r#"["DONE", "DROPPED"]"#)
            .unwrap();
        assert_eq!(cfg.workflow.done_keywords, vec!["DONE", "DROPPED"]);
    }

    #[test]
    fn zero_max_age_is_invalid() {
        let mut cfg = UrgencyConfig::default();
        cfg.max_age_days = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn workflow_classifies_states() {
        let wf = WorkflowConfig::default();
        assert!(wf.is_actionable_not_done(Some("TODO")));
        assert!(wf.is_actionable_not_done(Some("NEXT")));
        assert!(!wf.is_actionable_not_done(Some("DONE")));
        assert!(!wf.is_actionable_not_done(Some("SOMEDAY")));
        assert!(!wf.is_actionable_not_done(None));
    }

    #[test]
    fn load_from_writes_defaults_then_reads_them_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let first = Config::load_from(&path).unwrap();
        assert!(path.exists());

        let mut changed = first.clone();
        changed.urgency.deadline_coefficient = 9.0;
        changed.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.urgency.deadline_coefficient, 9.0);
    }

    #[test]
    fn load_from_reports_parse_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "urgency = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}

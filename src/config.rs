//! Runtime configuration read from the environment.
//!
//! | variable                  | default          |
//! |---------------------------|------------------|
//! | `HEARTWISE_DB_PATH`       | `heartwise.db`   |
//! | `HEARTWISE_SCORING_TABLE` | built-in v1      |
//! | `HEARTWISE_LOG_MODE`      | `auto` (stderr)  |
//! | `HEARTWISE_LOG_FILE`      | `heartwise.log`  |

use std::path::PathBuf;

use crate::domain::{ScoringEngine, ScoringTable};
use crate::HeartwiseError;

const DB_PATH_ENV: &str = "HEARTWISE_DB_PATH";
const SCORING_TABLE_ENV: &str = "HEARTWISE_SCORING_TABLE";
const LOG_MODE_ENV: &str = "HEARTWISE_LOG_MODE";
const LOG_FILE_ENV: &str = "HEARTWISE_LOG_FILE";

/// Where log output goes. Stdout is reserved for command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    Stderr,
    File,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            // auto, stderr, anything else
            _ => Self::Stderr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// JSON scoring table; `None` selects the built-in table
    pub scoring_table: Option<PathBuf>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("heartwise.db"),
            scoring_table: None,
            log_mode: LogMode::Stderr,
            log_file: PathBuf::from("heartwise.log"),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            db_path: get(DB_PATH_ENV).map_or(defaults.db_path, PathBuf::from),
            scoring_table: get(SCORING_TABLE_ENV).map(PathBuf::from),
            log_mode: get(LOG_MODE_ENV).map_or(defaults.log_mode, |v| LogMode::parse(&v)),
            log_file: get(LOG_FILE_ENV).map_or(defaults.log_file, PathBuf::from),
        }
    }

    /// Build the scoring engine for the configured table.
    ///
    /// # Errors
    /// Returns error if a configured table cannot be loaded or is invalid.
    pub fn load_engine(&self) -> Result<ScoringEngine, HeartwiseError> {
        match &self.scoring_table {
            Some(path) => {
                let table = ScoringTable::load(path)?;
                Ok(ScoringEngine::new(table)?)
            }
            None => Ok(ScoringEngine::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config, AppConfig::default());
        assert_eq!(
            config.load_engine().expect("Should build").table().version,
            "v1"
        );
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("HEARTWISE_DB_PATH", "/tmp/h.db"),
            ("HEARTWISE_LOG_MODE", "FILE"),
            ("HEARTWISE_LOG_FILE", " "),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/tmp/h.db"));
        assert_eq!(config.log_mode, LogMode::File);
        assert_eq!(config.log_file, PathBuf::from("heartwise.log"));
    }

    #[test]
    fn test_shipped_table_path() {
        let path = format!("{}/models/scoring_table_v1.json", env!("CARGO_MANIFEST_DIR"));
        let config = AppConfig::from_lookup(lookup(&[("HEARTWISE_SCORING_TABLE", path.as_str())]));
        let engine = config.load_engine().expect("Should load table");
        assert_eq!(engine, ScoringEngine::default());

        let missing = AppConfig::from_lookup(lookup(&[("HEARTWISE_SCORING_TABLE", "/nonexistent.json")]));
        assert!(matches!(missing.load_engine(), Err(HeartwiseError::Table(_))));
    }
}

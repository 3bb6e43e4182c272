//! Process configuration.
//!
//! # Responsibility
//! - Derive database, log and export locations from one data directory.
//! - Read overrides from `TASKDECK_*` environment variables.
//!
//! # Invariants
//! - Every path in a built config is absolute.
//! - Unparseable overrides are errors, never silently ignored.

use crate::logging::default_log_level;
use crate::scheduler::DEFAULT_SCAN_INTERVAL;
use chrono::Weekday;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DATA_DIR: &str = "TASKDECK_DATA_DIR";
pub const ENV_DB_PATH: &str = "TASKDECK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "TASKDECK_LOG_LEVEL";
pub const ENV_SCAN_INTERVAL_SECS: &str = "TASKDECK_SCAN_INTERVAL_SECS";
pub const ENV_WEEK_START: &str = "TASKDECK_WEEK_START";

const DB_FILE_NAME: &str = "taskdeck.sqlite3";
const DEFAULT_DATA_DIR_NAME: &str = "taskdeck";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    RelativePath { key: &'static str, value: String },
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RelativePath { key, value } => {
                write!(f, "{key} must be an absolute path, got `{value}`")
            }
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub export_dir: PathBuf,
    pub log_level: String,
    pub scan_interval: Duration,
    pub week_start: Weekday,
}

impl AppConfig {
    /// Lays out `db`, `logs` and `exports` under `data_dir`.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let data_dir = data_dir.into();
        require_absolute(ENV_DATA_DIR, &data_dir)?;
        Ok(Self {
            db_path: data_dir.join(DB_FILE_NAME),
            log_dir: data_dir.join("logs"),
            export_dir: data_dir.join("exports"),
            log_level: default_log_level().to_string(),
            scan_interval: DEFAULT_SCAN_INTERVAL,
            week_start: Weekday::Mon,
            data_dir,
        })
    }

    /// Reads the process environment; see the `ENV_*` constants.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Blank values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_dir = read(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DATA_DIR_NAME));
        let mut config = Self::for_data_dir(data_dir)?;

        if let Some(db_path) = read(ENV_DB_PATH) {
            let db_path = PathBuf::from(db_path);
            require_absolute(ENV_DB_PATH, &db_path)?;
            config.db_path = db_path;
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(secs) = read(ENV_SCAN_INTERVAL_SECS) {
            let parsed = secs
                .parse::<u64>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: ENV_SCAN_INTERVAL_SECS,
                    value: secs.clone(),
                })?;
            config.scan_interval = Duration::from_secs(parsed);
        }
        if let Some(day) = read(ENV_WEEK_START) {
            config.week_start = day.parse::<Weekday>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_WEEK_START,
                value: day.clone(),
            })?;
        }

        Ok(config)
    }
}

fn require_absolute(key: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.is_absolute() {
        return Ok(());
    }
    Err(ConfigError::RelativePath {
        key,
        value: path.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, ENV_DATA_DIR, ENV_SCAN_INTERVAL_SECS, ENV_WEEK_START};
    use chrono::Weekday;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn paths_derive_from_data_dir() {
        let dir = std::env::temp_dir().join("taskdeck-config-test");
        let config = AppConfig::for_data_dir(&dir).unwrap();
        assert_eq!(config.db_path, dir.join("taskdeck.sqlite3"));
        assert_eq!(config.log_dir, dir.join("logs"));
        assert_eq!(config.export_dir, dir.join("exports"));
        assert_eq!(config.week_start, Weekday::Mon);
    }

    #[test]
    fn overrides_are_parsed() {
        let dir = std::env::temp_dir().join("taskdeck-env");
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_DATA_DIR, dir.to_str().unwrap()),
            (ENV_SCAN_INTERVAL_SECS, "5"),
            (ENV_WEEK_START, "sun"),
        ]))
        .unwrap();
        assert_eq!(config.scan_interval, Duration::from_secs(5));
        assert_eq!(config.week_start, Weekday::Sun);
    }

    #[test]
    fn rejects_relative_data_dir_and_bad_interval() {
        let err = AppConfig::from_lookup(lookup(&[(ENV_DATA_DIR, "relative/dir")])).unwrap_err();
        assert!(matches!(err, ConfigError::RelativePath { .. }));

        let err = AppConfig::from_lookup(lookup(&[(ENV_SCAN_INTERVAL_SECS, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}

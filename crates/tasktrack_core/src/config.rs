//! Core runtime configuration.
//!
//! # Responsibility
//! - Collect the knobs an embedder sets once at startup: log level and
//!   directory, database location, default result ordering.
//! - Overlay `TASKTRACK_*` environment variables on top of defaults.
//!
//! # Invariants
//! - `log_level` is always one of `trace|debug|info|warn|error` after
//!   [`CoreConfig::validate`] or [`CoreConfig::from_env`].
//! - `database_path: None` means an in-memory database.

use crate::logging::{default_log_level, normalize_level};
use crate::search::SortSpec;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_LOG_LEVEL: &str = "TASKTRACK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TASKTRACK_LOG_DIR";
pub const ENV_DB_PATH: &str = "TASKTRACK_DB_PATH";
pub const ENV_DEFAULT_SORT: &str = "TASKTRACK_DEFAULT_SORT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` leaves logging off.
    pub log_dir: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    /// Applied by `Workspace::search` when a filter carries no sort.
    pub default_sort: Option<SortSpec>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            database_path: None,
            default_sort: None,
        }
    }
}

impl CoreConfig {
    /// Defaults overlaid with process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlays values returned by `lookup` for the `TASKTRACK_*` keys.
    ///
    /// Blank values are treated as unset.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(level) = read(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = read(ENV_DB_PATH) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(sort) = read(ENV_DEFAULT_SORT) {
            let spec = SortSpec::parse(&sort).ok_or_else(|| ConfigError::InvalidValue {
                key: ENV_DEFAULT_SORT,
                value: sort.clone(),
            })?;
            self.default_sort = Some(spec);
        }
        self.validate()
    }

    /// Normalizes `log_level` in place.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let level = normalize_level(&self.log_level).map_err(|_| ConfigError::InvalidValue {
            key: ENV_LOG_LEVEL,
            value: self.log_level.clone(),
        })?;
        self.log_level = level.to_string();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_DB_PATH, ENV_DEFAULT_SORT, ENV_LOG_LEVEL};
    use crate::search::{SortField, SortSpec};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_use_memory_database_and_no_sort() {
        let config = CoreConfig::default();
        assert!(config.database_path.is_none());
        assert!(config.default_sort.is_none());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn overrides_apply_and_normalize() {
        let mut config = CoreConfig::default();
        config
            .apply_overrides(lookup(&[
                (ENV_LOG_LEVEL, " WARNING "),
                (ENV_DB_PATH, "/tmp/tasks.db"),
                (ENV_DEFAULT_SORT, "due:desc"),
            ]))
            .expect("overrides should apply");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/tasks.db")));
        assert_eq!(config.default_sort, Some(SortSpec::desc(SortField::DueAt)));
    }

    #[test]
    fn blank_values_are_ignored_and_bad_values_rejected() {
        let mut config = CoreConfig::default();
        config.apply_overrides(lookup(&[(ENV_DB_PATH, "   ")])).expect("overrides should apply");
        assert!(config.database_path.is_none());

        let err = config
            .apply_overrides(lookup(&[(ENV_DEFAULT_SORT, "size")]))
            .expect_err("invalid override should be rejected");
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: ENV_DEFAULT_SORT,
                value: "size".to_string()
            }
        );
    }
}

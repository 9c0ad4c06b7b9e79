//! Runtime configuration resolved from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `LAZYTRACK_DB_PATH` | `<temp_dir>/lazytrack.sqlite3` |
//! | `LAZYTRACK_LOG_LEVEL` | `debug` (debug build) / `info` (release) |
//! | `LAZYTRACK_LOG_DIR` | unset: file logging disabled |
//! | `LAZYTRACK_LOCK_TIMEOUT_MS` | `5000` |
//! | `LAZYTRACK_MIXED_STATUS` | `retain` |

use crate::logging::LogLevel;
use crate::service::aggregation::MixedStatusPolicy;
use crate::service::{ServiceOptions, DEFAULT_LOCK_TIMEOUT};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "LAZYTRACK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "LAZYTRACK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LAZYTRACK_LOG_DIR";
pub const ENV_LOCK_TIMEOUT_MS: &str = "LAZYTRACK_LOCK_TIMEOUT_MS";
pub const ENV_MIXED_STATUS: &str = "LAZYTRACK_MIXED_STATUS";

const DEFAULT_DB_FILE_NAME: &str = "lazytrack.sqlite3";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub message: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.variable, self.message)
    }
}

impl Error for ConfigError {}

/// Resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    pub log_dir: Option<PathBuf>,
    pub lock_timeout: Duration,
    pub mixed_status: MixedStatusPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: LogLevel::build_default(),
            log_dir: None,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            mixed_status: MixedStatusPolicy::default(),
        }
    }
}

impl TrackerConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level.parse().map_err(|err| ConfigError {
                variable: ENV_LOG_LEVEL,
                message: format!("{err}"),
            })?;
        }

        if let Some(dir) = read(ENV_LOG_DIR) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(ConfigError {
                    variable: ENV_LOG_DIR,
                    message: format!("must be an absolute path, got `{}`", dir.display()),
                });
            }
            config.log_dir = Some(dir);
        }

        if let Some(raw) = read(ENV_LOCK_TIMEOUT_MS) {
            let millis = raw
                .parse::<u64>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or_else(|| ConfigError {
                    variable: ENV_LOCK_TIMEOUT_MS,
                    message: format!("expected a positive integer, got `{raw}`"),
                })?;
            config.lock_timeout = Duration::from_millis(millis);
        }

        if let Some(policy) = read(ENV_MIXED_STATUS) {
            config.mixed_status = policy.parse().map_err(|message| ConfigError {
                variable: ENV_MIXED_STATUS,
                message,
            })?;
        }

        Ok(config)
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            lock_timeout: self.lock_timeout,
            mixed_status: self.mixed_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TrackerConfig, ENV_DB_PATH, ENV_LOCK_TIMEOUT_MS, ENV_LOG_DIR, ENV_MIXED_STATUS};
    use crate::service::aggregation::MixedStatusPolicy;
    use std::collections::HashMap;
    use std::time::Duration;

    fn config_from(pairs: &[(&str, &str)]) -> Result<TrackerConfig, super::ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        TrackerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn values_are_parsed() {
        let config = config_from(&[
            (ENV_DB_PATH, "/tmp/track.db"),
            (ENV_LOCK_TIMEOUT_MS, "250"),
            (ENV_MIXED_STATUS, "in_progress"),
        ])
        .unwrap();
        assert_eq!(config.db_path.to_str(), Some("/tmp/track.db"));
        assert_eq!(config.lock_timeout, Duration::from_millis(250));
        assert_eq!(config.mixed_status, MixedStatusPolicy::InProgress);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = config_from(&[(ENV_LOCK_TIMEOUT_MS, "0")]).unwrap_err();
        assert_eq!(err.variable, ENV_LOCK_TIMEOUT_MS);

        let err = config_from(&[(ENV_LOG_DIR, "relative/logs")]).unwrap_err();
        assert_eq!(err.variable, ENV_LOG_DIR);

        let err = config_from(&[(ENV_MIXED_STATUS, "sometimes")]).unwrap_err();
        assert!(err.to_string().contains(ENV_MIXED_STATUS));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[(ENV_DB_PATH, "   ")]).unwrap();
        assert_eq!(config.db_path, TrackerConfig::default().db_path);
    }
}

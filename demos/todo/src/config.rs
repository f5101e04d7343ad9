//! Configuration for the todo application.
//!
//! Everything comes from environment variables, each with a default:
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `TODO_STORAGE_PATH` | unset (in-memory) | JSON file used as the local stash |
//! | `TODO_SYNC_URL` | unset (sync disabled) | HTTP endpoint receiving sync effects |
//! | `TODO_SYNC_RETRIES` | `3` | Retries for transient sync failures |
//! | `TODO_SYNC_TIMEOUT_SECS` | `10` | Per-request sync timeout |
//! | `TODO_SHUTDOWN_TIMEOUT_SECS` | `5` | Grace period for in-flight effects on exit |
//!
//! # Example
//!
//! ```no_run
//! use todo::config::TodoConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TodoConfig::from_env()?;
//! println!("Storage: {:?}", config.storage_path);
//! # Ok(())
//! # }
//! ```

use crate::error::ConfigError;
use mvu_runtime::retry::RetryPolicy;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Local stash location
pub const STORAGE_PATH_VAR: &str = "TODO_STORAGE_PATH";
/// Sync endpoint
pub const SYNC_URL_VAR: &str = "TODO_SYNC_URL";
/// Sync retries
pub const SYNC_RETRIES_VAR: &str = "TODO_SYNC_RETRIES";
/// Sync request timeout
pub const SYNC_TIMEOUT_VAR: &str = "TODO_SYNC_TIMEOUT_SECS";
/// Shutdown grace period
pub const SHUTDOWN_TIMEOUT_VAR: &str = "TODO_SHUTDOWN_TIMEOUT_SECS";

/// Sync collaborator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Endpoint receiving sync effects; `None` disables sync
    pub url: Option<String>,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl SyncConfig {
    /// Validate sync configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "sync url must be http(s), got {url:?}"
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation("sync timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy for transient failures
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new().with_max_retries(self.max_retries)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_retries: 3,
            timeout_secs: 10,
        }
    }
}

/// Todo application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoConfig {
    /// JSON stash; `None` keeps the list in memory only
    pub storage_path: Option<PathBuf>,
    /// Sync collaborator configuration
    pub sync: SyncConfig,
    /// Grace period for in-flight effects on exit, in seconds
    pub shutdown_timeout_secs: u64,
}

impl TodoConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or the result is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or the result is invalid
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            storage_path: get(STORAGE_PATH_VAR).map(PathBuf::from),
            sync: SyncConfig {
                url: get(SYNC_URL_VAR),
                max_retries: parse(SYNC_RETRIES_VAR, get(SYNC_RETRIES_VAR))?
                    .unwrap_or(defaults.sync.max_retries),
                timeout_secs: parse(SYNC_TIMEOUT_VAR, get(SYNC_TIMEOUT_VAR))?
                    .unwrap_or(defaults.sync.timeout_secs),
            },
            shutdown_timeout_secs: parse(SHUTDOWN_TIMEOUT_VAR, get(SHUTDOWN_TIMEOUT_VAR))?
                .unwrap_or(defaults.shutdown_timeout_secs),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration
    ///
    /// # Errors
    ///
    /// Returns error if any configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sync.validate()?;
        if self.shutdown_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "shutdown_timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Get shutdown grace period as Duration
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            storage_path: None,
            sync: SyncConfig::default(),
            shutdown_timeout_secs: 5,
        }
    }
}

fn parse<T: FromStr>(key: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    value
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Parse { key, value })
        })
        .transpose()
}

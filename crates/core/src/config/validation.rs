//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::cache::TableFormat;
use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// An unrecognized `default_format` only logs a warning; it is rejected
    /// by the table store at the call that uses it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_dir` is empty
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` or one of the base URLs is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_dir".into(), reason: "must not be empty".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }
        if self.api_base_url.is_empty() {
            return Err(ConfigError::Invalid { field: "api_base_url".into(), reason: "must not be empty".into() });
        }
        if self.loopstats_base_url.is_empty() {
            return Err(ConfigError::Invalid {
                field: "loopstats_base_url".into(),
                reason: "must not be empty".into(),
            });
        }

        if self.default_format.parse::<TableFormat>().is_err() {
            tracing::warn!(
                default_format = %self.default_format,
                "default_format is neither 'csv' nor 'parquet'; cache calls without an explicit format will fail"
            );
        }

        Ok(())
    }
}

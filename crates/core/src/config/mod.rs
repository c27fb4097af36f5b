//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PITLANE_*)
//! 2. TOML config file (if PITLANE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PITLANE_*)
/// 2. TOML config file (if PITLANE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Master switch for every cache read and write.
    ///
    /// Set via PITLANE_CACHE_ENABLED environment variable.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Secondary switch for the table cache; both switches must be on.
    ///
    /// Set via PITLANE_TABLE_CACHE_ENABLED environment variable.
    #[serde(default = "default_true")]
    pub table_cache_enabled: bool,

    /// Root directory for cached tables.
    ///
    /// Set via PITLANE_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Serialization format used when a call does not name one (`csv` or `parquet`).
    ///
    /// Set via PITLANE_DEFAULT_FORMAT environment variable. Checked when used, not here.
    #[serde(default = "default_format")]
    pub default_format: String,

    /// Base URL of the cacher feed API.
    ///
    /// Set via PITLANE_API_BASE_URL environment variable.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL of the loop statistics API.
    ///
    /// Set via PITLANE_LOOPSTATS_BASE_URL environment variable.
    #[serde(default = "default_loopstats_base_url")]
    pub loopstats_base_url: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via PITLANE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via PITLANE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// The slice of configuration the table store reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub cache_enabled: bool,
    pub table_cache_enabled: bool,
    pub cache_dir: PathBuf,
    pub default_format: String,
}

impl CacheConfig {
    /// Cache rooted at `cache_dir` with both switches on and CSV as the default format.
    pub fn at(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_enabled: true,
            table_cache_enabled: true,
            cache_dir: cache_dir.into(),
            default_format: default_format(),
        }
    }

    /// True only when both switches are on.
    pub fn is_active(&self) -> bool {
        self.cache_enabled && self.table_cache_enabled
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./pitlane-cache")
}

fn default_format() -> String {
    "csv".into()
}

fn default_api_base_url() -> String {
    "https://cf.nascar.com/cacher".into()
}

fn default_loopstats_base_url() -> String {
    "https://cf.nascar.com/loopstats/prod".into()
}

fn default_user_agent() -> String {
    "pitlane/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            table_cache_enabled: true,
            cache_dir: default_cache_dir(),
            default_format: default_format(),
            api_base_url: default_api_base_url(),
            loopstats_base_url: default_loopstats_base_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Settings handed to the table store.
    pub fn cache(&self) -> CacheConfig {
        CacheConfig {
            cache_enabled: self.cache_enabled,
            table_cache_enabled: self.table_cache_enabled,
            cache_dir: self.cache_dir.clone(),
            default_format: self.default_format.clone(),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PITLANE_`
    /// 2. TOML file from `PITLANE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PITLANE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PITLANE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.cache_enabled);
        assert!(config.table_cache_enabled);
        assert_eq!(config.cache_dir, PathBuf::from("./pitlane-cache"));
        assert_eq!(config.default_format, "csv");
        assert_eq!(config.api_base_url, "https://cf.nascar.com/cacher");
        assert_eq!(config.user_agent, "pitlane/0.1");
        assert_eq!(config.timeout_ms, 20_000);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_cache_slice() {
        let config = AppConfig { table_cache_enabled: false, ..Default::default() };
        let cache = config.cache();
        assert_eq!(cache.cache_dir, config.cache_dir);
        assert!(!cache.is_active());
        assert!(CacheConfig::at("/tmp/cache").is_active());
    }

    #[test]
    fn test_load_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PITLANE_CACHE_DIR", "/var/cache/pitlane");
            jail.set_env("PITLANE_DEFAULT_FORMAT", "parquet");
            jail.set_env("PITLANE_TABLE_CACHE_ENABLED", "false");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_dir, PathBuf::from("/var/cache/pitlane"));
            assert_eq!(config.default_format, "parquet");
            assert!(config.cache_enabled);
            assert!(!config.table_cache_enabled);
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("pitlane.toml", "cache_dir = \"/srv/tables\"\ntimeout_ms = 5000\n")?;
            jail.set_env("PITLANE_CONFIG_FILE", "pitlane.toml");
            jail.set_env("PITLANE_TIMEOUT_MS", "7000");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_dir, PathBuf::from("/srv/tables"));
            assert_eq!(config.timeout_ms, 7000);
            Ok(())
        });
    }
}

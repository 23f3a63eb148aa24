//! Cache configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PGCACHE_*)
//! 2. TOML config file (if PGCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Reserved advisory-lock id for fleet-wide cleanup coordination.
///
/// No other caller may use this id against the same database.
pub const DEFAULT_CLEANUP_LOCK_ID: i64 = 42_000;

/// Cache configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PGCACHE_*)
/// 2. TOML config file (if PGCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// PostgreSQL connection string.
    ///
    /// Set via PGCACHE_DATABASE_URL environment variable.
    #[serde(default)]
    pub database_url: String,

    /// Schema that holds the cache table. Unset relies on `search_path`.
    ///
    /// Set via PGCACHE_SCHEMA_NAME environment variable.
    #[serde(default)]
    pub schema_name: Option<String>,

    /// Name of the cache table.
    ///
    /// Set via PGCACHE_TABLE_NAME environment variable.
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Sliding interval applied when an entry requests none, in milliseconds.
    /// Zero disables the default.
    ///
    /// Set via PGCACHE_DEFAULT_SLIDING_MS environment variable.
    #[serde(default = "default_sliding_ms")]
    pub default_sliding_ms: u64,

    /// Interval between cleanup ticks in milliseconds.
    ///
    /// Set via PGCACHE_CLEANUP_INTERVAL_MS environment variable.
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,

    /// Maximum rows deleted per purge batch.
    ///
    /// Set via PGCACHE_PURGE_BATCH_LIMIT environment variable.
    #[serde(default = "default_purge_batch_limit")]
    pub purge_batch_limit: i64,

    /// Advisory-lock id reserved for cleanup.
    ///
    /// Set via PGCACHE_CLEANUP_LOCK_ID environment variable.
    #[serde(default = "default_cleanup_lock_id")]
    pub cleanup_lock_id: i64,

    /// Whether to create the schema, table and index at startup.
    ///
    /// Set via PGCACHE_CREATE_INFRASTRUCTURE environment variable.
    #[serde(default = "default_true")]
    pub create_infrastructure: bool,

    /// Maximum pooled connections.
    ///
    /// Set via PGCACHE_MAX_CONNECTIONS environment variable.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_table_name() -> String {
    "cache_items".into()
}

fn default_sliding_ms() -> u64 {
    20 * 60 * 1000
}

fn default_cleanup_interval_ms() -> u64 {
    5 * 60 * 1000
}

fn default_purge_batch_limit() -> i64 {
    1000
}

fn default_cleanup_lock_id() -> i64 {
    DEFAULT_CLEANUP_LOCK_ID
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    10
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            schema_name: None,
            table_name: default_table_name(),
            default_sliding_ms: default_sliding_ms(),
            cleanup_interval_ms: default_cleanup_interval_ms(),
            purge_batch_limit: default_purge_batch_limit(),
            cleanup_lock_id: default_cleanup_lock_id(),
            create_infrastructure: true,
            max_connections: default_max_connections(),
        }
    }
}

impl CacheConfig {
    /// Config for the given database with every other value at its default.
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self { database_url: database_url.into(), ..Default::default() }
    }

    /// Default sliding interval, or `None` when disabled.
    pub fn default_sliding(&self) -> Option<Duration> {
        (self.default_sliding_ms > 0).then(|| Duration::from_millis(self.default_sliding_ms))
    }

    /// Cleanup interval as Duration for use with tokio.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PGCACHE_`
    /// 2. TOML file from `PGCACHE_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("PGCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PGCACHE_")
                .ignore(&["CONFIG_FILE", "TEST_DATABASE_URL"])
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
        let config = CacheConfig::default();
        assert!(config.database_url.is_empty());
        assert!(config.schema_name.is_none());
        assert_eq!(config.table_name, "cache_items");
        assert_eq!(config.default_sliding_ms, 1_200_000);
        assert_eq!(config.cleanup_interval_ms, 300_000);
        assert_eq!(config.purge_batch_limit, 1000);
        assert_eq!(config.cleanup_lock_id, 42_000);
        assert!(config.create_infrastructure);
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn test_duration_helpers() {
        let config = CacheConfig::default();
        assert_eq!(config.default_sliding(), Some(Duration::from_secs(20 * 60)));
        assert_eq!(config.cleanup_interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_zero_sliding_disables_default() {
        let config = CacheConfig { default_sliding_ms: 0, ..Default::default() };
        assert!(config.default_sliding().is_none());
    }

    #[test]
    fn test_load_layers_env_over_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "pgcache.toml",
                r#"
                database_url = "postgres://file@localhost/cache"
                table_name = "from_file"
                purge_batch_limit = 50
                "#,
            )?;
            jail.set_env("PGCACHE_CONFIG_FILE", "pgcache.toml");
            jail.set_env("PGCACHE_TABLE_NAME", "from_env");

            let config = CacheConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.database_url, "postgres://file@localhost/cache");
            assert_eq!(config.table_name, "from_env");
            assert_eq!(config.purge_batch_limit, 50);
            assert_eq!(config.cleanup_interval_ms, 300_000);
            Ok(())
        });
    }

    #[test]
    fn test_load_requires_database_url() {
        figment::Jail::expect_with(|_jail| {
            let result = CacheConfig::load();
            assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "database_url"));
            Ok(())
        });
    }
}

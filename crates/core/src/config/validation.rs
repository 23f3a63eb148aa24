//! Configuration validation rules.
//!
//! This module provides validation logic for `CacheConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::CacheConfig;
use thiserror::Error;

/// Longest identifier PostgreSQL keeps without truncation.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl CacheConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `database_url` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `table_name` or `schema_name` is not a plain SQL identifier
    /// - `cleanup_interval_ms` is less than 100ms
    /// - `purge_batch_limit` is outside `1..=100_000`
    /// - `max_connections` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "database_url".into(),
                hint: "Set PGCACHE_DATABASE_URL environment variable".into(),
            });
        }

        check_identifier("table_name", &self.table_name)?;
        if let Some(schema) = &self.schema_name {
            check_identifier("schema_name", schema)?;
        }

        if self.cleanup_interval_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "cleanup_interval_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }

        if !(1..=100_000).contains(&self.purge_batch_limit) {
            return Err(ConfigError::Invalid {
                field: "purge_batch_limit".into(),
                reason: "must be between 1 and 100000".into(),
            });
        }

        if self.max_connections == 0 {
            return Err(ConfigError::Invalid {
                field: "max_connections".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.default_sliding_ms > 0 && self.default_sliding_ms < 1000 {
            tracing::warn!(
                default_sliding_ms = self.default_sliding_ms,
                "default sliding interval is under one second; entries will expire almost immediately"
            );
        }

        Ok(())
    }
}

/// Table and schema names are interpolated into statement text, so only plain
/// identifiers are accepted.
fn check_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid { field: field.into(), reason: reason.into() };

    let mut chars = value.chars();
    match chars.next() {
        None => return Err(invalid("must not be empty")),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err(invalid("must start with a letter or underscore"));
        }
        Some(_) => {}
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid("may only contain letters, digits and underscores"));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(invalid("must not exceed 63 bytes"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CacheConfig {
        CacheConfig::with_database_url("postgres://postgres@localhost/cache")
    }

    #[test]
    fn test_validate_default_with_url() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_url() {
        let result = CacheConfig::default().validate();
        assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "database_url"));
    }

    #[test]
    fn test_validate_table_name_injection() {
        let config = CacheConfig { table_name: "cache\"; DROP TABLE x; --".into(), ..valid() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "table_name"));
    }

    #[test]
    fn test_validate_empty_table_name() {
        let config = CacheConfig { table_name: String::new(), ..valid() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "table_name"));
    }

    #[test]
    fn test_validate_table_name_leading_digit() {
        let config = CacheConfig { table_name: "1cache".into(), ..valid() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_schema_name() {
        let config = CacheConfig { schema_name: Some("cache-schema".into()), ..valid() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "schema_name"));

        let config = CacheConfig { schema_name: Some("_cache_2".into()), ..valid() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_identifier_length() {
        let config = CacheConfig { table_name: "a".repeat(63), ..valid() };
        assert!(config.validate().is_ok());

        let config = CacheConfig { table_name: "a".repeat(64), ..valid() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_cleanup_interval_too_small() {
        let config = CacheConfig { cleanup_interval_ms: 99, ..valid() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cleanup_interval_ms"));
    }

    #[test]
    fn test_validate_purge_batch_limit_bounds() {
        for limit in [0, -5, 100_001] {
            let config = CacheConfig { purge_batch_limit: limit, ..valid() };
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid { ref field, .. }) if field == "purge_batch_limit")
            );
        }

        let config = CacheConfig { purge_batch_limit: 1, ..valid() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_connections() {
        let config = CacheConfig { max_connections: 0, ..valid() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "max_connections"));
    }
}

//! Unified error types for pgcache.
//!
//! Storage failures surface to the immediate caller and are never retried here.
//! Cancellation is kept distinct so the cleanup loop can treat it as a stop signal.

use rmcp::model::{ErrorCode, ErrorData as McpError};

use crate::config::ConfigError;

/// Unified error type for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty key, zero sliding interval).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(#[from] sqlx::Error),

    /// Table provisioning failed.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// The operation was interrupted by its cancellation token.
    #[error("CANCELLED")]
    Cancelled,

    /// Configuration could not be loaded or failed validation.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),

    /// The async runtime backing a blocking handle could not start.
    #[error("RUNTIME_ERROR: {0}")]
    Runtime(#[source] std::io::Error),
}

impl Error {
    /// Whether this error is a cooperative stop rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::Cancelled => (-32800, "Request cancelled".to_string()),
            Error::Config(e) => (-32003, e.to_string()),
            Error::Runtime(e) => (-32603, e.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("key must not be empty".to_string());
        assert!(err.to_string().contains("INVALID_INPUT"));
        assert!(err.to_string().contains("key must not be empty"));
    }

    #[test]
    fn test_database_error_display() {
        let err = Error::from(sqlx::Error::PoolClosed);
        assert!(err.to_string().starts_with("CACHE_ERROR"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_cancelled_is_distinguished() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::MigrationFailed("boom".into()).is_cancelled());
    }

    #[test]
    fn test_error_to_mcp_error() {
        let mcp_err: McpError = Error::InvalidInput("bad".into()).into();
        assert_eq!(mcp_err.code.0, -32602);

        let mcp_err: McpError = Error::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(mcp_err.code.0, -32002);

        let mcp_err: McpError = Error::Cancelled.into();
        assert_eq!(mcp_err.code.0, -32800);

        let mcp_err: McpError = Error::Runtime(std::io::Error::other("no threads")).into();
        assert_eq!(mcp_err.code.0, -32603);
    }

    #[test]
    fn test_runtime_error_is_not_caller_error() {
        let err = Error::Runtime(std::io::Error::other("no threads"));
        assert!(err.to_string().starts_with("RUNTIME_ERROR"));
        assert!(!matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_config_error_wraps() {
        let err: Error = ConfigError::Missing { field: "database_url".into(), hint: "set it".into() }.into();
        assert!(err.to_string().contains("database_url"));
    }
}

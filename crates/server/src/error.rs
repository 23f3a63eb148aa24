//! Tool-level errors for the pgcache server.
//!
//! Cache failures arrive as `pgcache_core::Error` and convert on their own;
//! these cover bad tool arguments caught before the cache is touched.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// A value could not be decoded with the requested encoding.
    #[error("INVALID_ENCODING: {0}")]
    InvalidEncoding(String),

    /// `expires_at` is not an RFC 3339 timestamp.
    #[error("INVALID_TIMESTAMP: {0}")]
    InvalidTimestamp(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let message = match &err {
            ToolError::InvalidEncoding(msg) | ToolError::InvalidTimestamp(msg) => msg.clone(),
        };

        McpError { code: ErrorCode(-32602), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_maps_to_invalid_params() {
        let err: McpError = ToolError::InvalidEncoding("odd length".into()).into();
        assert_eq!(err.code, ErrorCode(-32602));
        assert_eq!(err.message, "odd length");
    }
}

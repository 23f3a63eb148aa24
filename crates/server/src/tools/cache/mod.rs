//! Cache-related MCP tools.
//!
//! Values cross the protocol as text. `encoding` selects how a value's bytes
//! map to that text: `utf8` (the default) or `hex`.

pub mod get;
pub mod purge;
pub mod refresh;
pub mod remove;
pub mod set;

pub use get::{CacheGetParams, get_impl};
pub use purge::{CachePurgeParams, purge_impl};
pub use refresh::{CacheRefreshParams, refresh_impl};
pub use remove::{CacheRemoveParams, remove_impl};
pub use set::{CacheSetParams, set_impl};

use pgcache_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// How value bytes are written as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValueEncoding {
    #[default]
    Utf8,
    Hex,
}

impl ValueEncoding {
    pub fn decode(self, text: &str) -> Result<Vec<u8>, ToolError> {
        match self {
            ValueEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            ValueEncoding::Hex => {
                hex::decode(text).map_err(|e| ToolError::InvalidEncoding(format!("invalid hex value: {e}")))
            }
        }
    }

    /// Stored bytes that are not UTF-8 must be read back with `hex`.
    pub fn encode(self, bytes: Vec<u8>) -> Result<String, ToolError> {
        match self {
            ValueEncoding::Utf8 => String::from_utf8(bytes).map_err(|_| {
                ToolError::InvalidEncoding("stored value is not valid UTF-8; retry with encoding \"hex\"".into())
            }),
            ValueEncoding::Hex => Ok(hex::encode(bytes)),
        }
    }
}

/// Serialize a tool's output as the pretty-printed JSON text of a successful result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_round_trip() {
        let bytes = ValueEncoding::Utf8.decode("héllo").unwrap();
        assert_eq!(ValueEncoding::Utf8.encode(bytes).unwrap(), "héllo");
    }

    #[test]
    fn test_hex_decode() {
        assert_eq!(ValueEncoding::Hex.decode("00ff10").unwrap(), vec![0x00, 0xff, 0x10]);
        assert_eq!(ValueEncoding::Hex.encode(vec![0xde, 0xad]).unwrap(), "dead");
    }

    #[test]
    fn test_hex_decode_rejects_bad_input() {
        assert!(matches!(ValueEncoding::Hex.decode("abc"), Err(ToolError::InvalidEncoding(_))));
        assert!(matches!(ValueEncoding::Hex.decode("zz"), Err(ToolError::InvalidEncoding(_))));
    }

    #[test]
    fn test_utf8_encode_rejects_binary() {
        assert!(matches!(ValueEncoding::Utf8.encode(vec![0xff, 0xfe]), Err(ToolError::InvalidEncoding(_))));
    }

    #[test]
    fn test_encoding_deserializes_lowercase() {
        let enc: ValueEncoding = serde_json::from_str("\"hex\"").unwrap();
        assert_eq!(enc, ValueEncoding::Hex);
        assert_eq!(ValueEncoding::default(), ValueEncoding::Utf8);
    }
}

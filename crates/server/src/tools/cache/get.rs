//! cache_get tool implementation.
//!
//! Reads a live entry, sliding its expiry when it has a sliding interval.

use pgcache_core::{Lookup, PgCache};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{ValueEncoding, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Key of the entry to read.
    pub key: String,

    /// Encoding for the returned value: "utf8" (default) or "hex".
    #[serde(default)]
    pub encoding: ValueEncoding,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub key: String,

    /// Whether a live entry exists. A found entry may still carry a null value.
    pub found: bool,

    pub value: Option<String>,

    pub encoding: ValueEncoding,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(
    cache: &PgCache, cancel: &CancellationToken, params: CacheGetParams,
) -> Result<CallToolResult, McpError> {
    let lookup = cache.get_with_cancel(&params.key, cancel).await?;

    let (found, value) = match lookup {
        Lookup::Found(Some(bytes)) => (true, Some(params.encoding.encode(bytes)?)),
        Lookup::Found(None) => (true, None),
        Lookup::Missing => (false, None),
    };

    json_result(&CacheGetOutput { key: params.key, found, value, encoding: params.encoding })
}

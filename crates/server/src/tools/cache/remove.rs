//! cache_remove tool implementation.

use pgcache_core::PgCache;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::json_result;

/// Parameters for the cache_remove tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheRemoveParams {
    /// Key of the entry to delete.
    pub key: String,
}

/// Output from the cache_remove tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheRemoveOutput {
    pub key: String,

    /// Whether an entry existed. Removing a missing key is not an error.
    pub removed: bool,
}

/// Implementation of the cache_remove tool.
pub async fn remove_impl(
    cache: &PgCache, cancel: &CancellationToken, params: CacheRemoveParams,
) -> Result<CallToolResult, McpError> {
    let removed = cache.remove_with_cancel(&params.key, cancel).await?;
    json_result(&CacheRemoveOutput { key: params.key, removed })
}

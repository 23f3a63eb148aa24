//! cache_refresh tool implementation.
//!
//! Slides an entry's expiry forward without returning its value, even when
//! the entry has expired but not yet been purged.

use pgcache_core::PgCache;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::json_result;

/// Parameters for the cache_refresh tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheRefreshParams {
    /// Key of the entry to refresh.
    pub key: String,
}

/// Output from the cache_refresh tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheRefreshOutput {
    pub key: String,

    /// False when the entry is missing or has no sliding interval.
    pub refreshed: bool,
}

/// Implementation of the cache_refresh tool.
pub async fn refresh_impl(
    cache: &PgCache, cancel: &CancellationToken, params: CacheRefreshParams,
) -> Result<CallToolResult, McpError> {
    let refreshed = cache.refresh_with_cancel(&params.key, cancel).await?;
    json_result(&CacheRefreshOutput { key: params.key, refreshed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::cache::testing::{drop_cache, parse_output, test_cache};
    use pgcache_core::EntryOptions;
    use std::time::Duration;

    #[tokio::test]
    async fn test_refresh_impl() {
        let Some(cache) = test_cache("refresh").await else { return };
        let options = EntryOptions::new().with_sliding_expiration(Duration::from_secs(60));
        cache.set("k", Some(b"v".as_slice()), &options).await.unwrap();

        let params = CacheRefreshParams { key: "k".to_string() };
        let result = refresh_impl(&cache, &CancellationToken::new(), params).await.unwrap();
        let output: CacheRefreshOutput = parse_output(&result);
        assert!(output.refreshed);

        let params = CacheRefreshParams { key: "missing".to_string() };
        let result = refresh_impl(&cache, &CancellationToken::new(), params).await.unwrap();
        let output: CacheRefreshOutput = parse_output(&result);
        assert!(!output.refreshed);

        drop_cache(cache).await;
    }
}

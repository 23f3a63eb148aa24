//! cache_set tool implementation.
//!
//! Inserts or replaces an entry. Expiry options combine: an entry may have
//! both a sliding window and an absolute ceiling.

use std::time::Duration;

use chrono::{DateTime, Utc};
use pgcache_core::{EntryOptions, PgCache};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{ValueEncoding, json_result};
use crate::error::ToolError;

/// Parameters for the cache_set tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheSetParams {
    /// Key of the entry to write.
    pub key: String,

    /// Value to store. Omit to store a null value.
    pub value: Option<String>,

    /// Encoding of `value`: "utf8" (default) or "hex".
    #[serde(default)]
    pub encoding: ValueEncoding,

    /// Sliding expiration in milliseconds; each read pushes expiry this far ahead.
    pub sliding_ms: Option<u64>,

    /// Absolute expiration in milliseconds from now.
    pub ttl_ms: Option<u64>,

    /// Absolute expiration as an RFC 3339 timestamp. Takes precedence over `ttl_ms`.
    pub expires_at: Option<String>,
}

impl CacheSetParams {
    fn entry_options(&self) -> Result<EntryOptions, ToolError> {
        let mut options = EntryOptions::new();

        if let Some(at) = &self.expires_at {
            let at = DateTime::parse_from_rfc3339(at)
                .map_err(|e| ToolError::InvalidTimestamp(format!("expires_at {at:?}: {e}")))?;
            options = options.with_absolute_expiration(at.with_timezone(&Utc));
        }
        if let Some(ms) = self.ttl_ms {
            options = options.with_absolute_expiration_relative_to_now(Duration::from_millis(ms));
        }
        if let Some(ms) = self.sliding_ms {
            options = options.with_sliding_expiration(Duration::from_millis(ms));
        }

        Ok(options)
    }
}

/// Output from the cache_set tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheSetOutput {
    pub key: String,
    pub stored: bool,
}

/// Implementation of the cache_set tool.
pub async fn set_impl(
    cache: &PgCache, cancel: &CancellationToken, params: CacheSetParams,
) -> Result<CallToolResult, McpError> {
    let options = params.entry_options()?;
    let value = params.value.as_deref().map(|text| params.encoding.decode(text)).transpose()?;

    let stored = cache
        .set_with_cancel(&params.key, value.as_deref(), &options, cancel)
        .await?;

    json_result(&CacheSetOutput { key: params.key, stored })
}

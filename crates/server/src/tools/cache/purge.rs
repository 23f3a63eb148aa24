//! cache_purge tool implementation.
//!
//! Runs one cleanup pass on demand. It takes the same advisory lock as the
//! background loop, so it reports `skipped` while another instance is purging.

use pgcache_core::{PgCache, PurgeReport, SweepOutcome};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// True when another instance held the cleanup lock.
    pub skipped: bool,

    /// Number of expired entries deleted.
    pub deleted: u64,

    pub batches: u64,

    /// True when shutdown interrupted the purge.
    pub cancelled: bool,
}

impl From<SweepOutcome> for CachePurgeOutput {
    fn from(outcome: SweepOutcome) -> Self {
        let (skipped, report) = match outcome {
            SweepOutcome::Purged(report) => (false, report),
            SweepOutcome::Skipped => (true, PurgeReport::default()),
        };

        Self { skipped, deleted: report.deleted, batches: report.batches, cancelled: report.cancelled }
    }
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(
    cache: &PgCache, cancel: &CancellationToken, _params: CachePurgeParams,
) -> Result<CallToolResult, McpError> {
    let outcome = cache.sweep_now(cancel).await?;
    json_result(&CachePurgeOutput::from(outcome))
}

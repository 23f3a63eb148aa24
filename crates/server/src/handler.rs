//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the cache tool implementations.
use crate::tools::cache::{
    CacheGetParams, CachePurgeParams, CacheRefreshParams, CacheRemoveParams, CacheSetParams, get_impl, purge_impl,
    refresh_impl, remove_impl, set_impl,
};

use pgcache_core::PgCache;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use tokio_util::sync::CancellationToken;

/// The main MCP server handler for pgcache.
///
/// Every tool call runs under `shutdown`, so in-flight cache calls end with
/// `CANCELLED` once the process starts shutting down.
#[derive(Clone)]
pub struct PgCacheServer {
    cache: PgCache,
    shutdown: CancellationToken,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl PgCacheServer {
    /// Create a new server handler.
    pub fn new(cache: PgCache, shutdown: CancellationToken) -> Self {
        Self { cache, shutdown, tool_router: Self::tool_router() }
    }

    #[tool(description = "Read a cache entry by key. Sliding entries have their expiry pushed forward by the read.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.cache, &self.shutdown, params.0).await
    }

    #[tool(
        description = "Insert or replace a cache entry. Optional sliding_ms, ttl_ms, or RFC 3339 expires_at control expiry; omit all for the server default."
    )]
    async fn cache_set(&self, params: Parameters<CacheSetParams>) -> Result<CallToolResult, McpError> {
        set_impl(&self.cache, &self.shutdown, params.0).await
    }

    #[tool(description = "Push a sliding cache entry's expiry forward without reading its value.")]
    async fn cache_refresh(&self, params: Parameters<CacheRefreshParams>) -> Result<CallToolResult, McpError> {
        refresh_impl(&self.cache, &self.shutdown, params.0).await
    }

    #[tool(description = "Delete a cache entry by key. Removing a missing key succeeds with removed=false.")]
    async fn cache_remove(&self, params: Parameters<CacheRemoveParams>) -> Result<CallToolResult, McpError> {
        remove_impl(&self.cache, &self.shutdown, params.0).await
    }

    #[tool(description = "Delete expired cache entries now, unless another instance holds the cleanup lock.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.cache, &self.shutdown, params.0).await
    }
}

impl ServerHandler for PgCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "pgcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

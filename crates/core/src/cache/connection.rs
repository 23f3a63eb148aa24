//! Database connection management.
//!
//! This module opens the PostgreSQL pool used by the cache and hands out
//! connections: pooled ones for data-plane calls, and detached sessions for
//! work that holds session-scoped advisory locks.

use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::Postgres;

use super::table::TableRef;
use crate::Error;
use crate::config::CacheConfig;

/// Cache database handle.
///
/// Wraps a sqlx `PgPool` together with the table the cache lives in.
/// Cloning is cheap; clones share the pool.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) pool: PgPool,
    pub(crate) table: TableRef,
}

impl CacheDb {
    /// Open a pool for the configured database.
    ///
    /// One connection is established up front, so a bad URL or unreachable
    /// server fails here rather than on the first cache call.
    pub async fn connect(config: &CacheConfig) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        tracing::debug!(max_connections = config.max_connections, "opened cache pool");

        Ok(Self::from_pool(pool, TableRef::from_config(config)))
    }

    /// Adopt an existing pool.
    pub fn from_pool(pool: PgPool, table: TableRef) -> Self {
        Self { pool, table }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Check out a pooled connection for a single call.
    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>, Error> {
        Ok(self.pool.acquire().await?)
    }

    /// Open a connection that does not return to the pool.
    ///
    /// Closing or dropping it ends the database session, which releases every
    /// session-scoped advisory lock it holds.
    pub async fn acquire_session(&self) -> Result<PgConnection, Error> {
        Ok(self.pool.acquire().await?.detach())
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

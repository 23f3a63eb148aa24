//! Advisory-lock coordination for fleet-wide cleanup.
//!
//! The cleanup lock is session scoped and taken on the detached connection in
//! a [`LockSession`]. Closing the session unlocks explicitly before the
//! connection goes away; the disconnect only covers sessions that are dropped.

use sqlx::Connection;
use sqlx::postgres::PgConnection;
use tokio_util::sync::CancellationToken;

use super::commands::{CacheCommand, ReleaseLocks, TryAcquireLock};
use super::connection::CacheDb;
use super::purge::{PurgeExpired, PurgeReport};
use super::table::TableRef;
use crate::Error;

/// A database session dedicated to holding advisory locks.
#[derive(Debug)]
pub struct LockSession {
    conn: PgConnection,
    table: TableRef,
}

impl LockSession {
    /// Open a session outside the pool.
    pub async fn open(db: &CacheDb) -> Result<Self, Error> {
        Ok(Self { conn: db.acquire_session().await?, table: db.table().clone() })
    }

    /// Try to take the lock without waiting.
    ///
    /// `false` means another session holds it; that is contention, not an error.
    pub async fn try_acquire(&mut self, id: i64) -> Result<bool, Error> {
        TryAcquireLock { id }.execute(&mut self.conn, &self.table).await
    }

    /// Purge expired rows on this session, typically while holding the lock.
    pub async fn purge(&mut self, limit: i64, cancel: &CancellationToken) -> Result<PurgeReport, Error> {
        PurgeExpired { limit, cancel }.execute(&mut self.conn, &self.table).await
    }

    /// Release every lock the session holds, then end it.
    ///
    /// Locks are free for other sessions once this returns. If the unlock
    /// fails the session is still closed, and the server drops its locks
    /// when it notices the disconnect.
    pub async fn close(mut self) -> Result<(), Error> {
        let released = ReleaseLocks.execute(&mut self.conn, &self.table).await;
        self.conn.close().await?;
        released
    }
}

/// What one cleanup tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// This instance held the lock and ran the purge.
    Purged(PurgeReport),
    /// Another instance holds the lock.
    Skipped,
}

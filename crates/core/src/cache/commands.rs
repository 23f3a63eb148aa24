//! Data-plane cache commands.
//!
//! Each operation is a small struct implementing [`CacheCommand`]. A command
//! runs exactly one statement against a connection it is handed, so its
//! atomicity is the statement's atomicity. Callers pick the command type
//! directly; there is no runtime lookup.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::PgConnection;
use tokio_util::sync::CancellationToken;

use super::policy::{self, EntryOptions, ExpiryPlan};
use super::table::TableRef;
use crate::Error;

/// Advances `expires_at` by the stored sliding interval. `GREATEST` keeps the
/// expiry monotonic when the writer's clock ran ahead of the database clock;
/// `LEAST` keeps it under the absolute ceiling (NULL ceilings are ignored).
const SLIDE_EXPIRY: &str = "LEAST(GREATEST(expires_at, now() + sliding_interval), absolute_expiry)";

/// One cache operation.
pub trait CacheCommand {
    type Output;

    fn execute(
        &self, conn: &mut PgConnection, table: &TableRef,
    ) -> impl Future<Output = Result<Self::Output, Error>> + Send;
}

/// Run `fut`, abandoning it with [`Error::Cancelled`] if `cancel` fires first.
pub async fn run_cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

/// Result of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Live entry; the stored payload may itself be null.
    Found(Option<Vec<u8>>),
    /// No live entry under the key.
    Missing,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Payload bytes, treating a stored null like a miss.
    pub fn into_value(self) -> Option<Vec<u8>> {
        match self {
            Lookup::Found(value) => value,
            Lookup::Missing => None,
        }
    }
}

/// Read a live entry, sliding its expiry forward when it has a sliding interval.
#[derive(Debug, Clone, Copy)]
pub struct GetItem<'a> {
    pub key: &'a str,
}

impl GetItem<'_> {
    /// Every live row is locked and returned by the same `UPDATE`; only rows
    /// with a sliding interval get a new expiry. A concurrent write is
    /// re-checked against the same predicate, so a key that stays live
    /// through the write is never reported missing.
    pub(crate) fn sql(table: &TableRef) -> String {
        format!(
            "UPDATE {table}
            SET expires_at = CASE
                WHEN sliding_interval IS NULL THEN expires_at
                ELSE {SLIDE_EXPIRY}
            END
            WHERE key = $1
              AND (expires_at IS NULL OR expires_at > now())
            RETURNING value"
        )
    }
}

impl CacheCommand for GetItem<'_> {
    type Output = Lookup;

    async fn execute(&self, conn: &mut PgConnection, table: &TableRef) -> Result<Lookup, Error> {
        tracing::debug!(key = self.key, "get item");

        let sql = Self::sql(table);
        tracing::trace!(sql = %sql, "executing sql");

        let row: Option<Option<Vec<u8>>> = sqlx::query_scalar(&sql).bind(self.key).fetch_optional(conn).await?;

        match row {
            Some(value) => {
                tracing::debug!(key = self.key, bytes = value.as_ref().map_or(0, Vec::len), "cache hit");
                Ok(Lookup::Found(value))
            }
            None => {
                tracing::debug!(key = self.key, "cache miss");
                Ok(Lookup::Missing)
            }
        }
    }
}

/// Insert or fully replace an entry.
///
/// All three expiry fields are always written, so a write without expiry
/// clears any sliding or absolute metadata left by an earlier write.
#[derive(Debug, Clone, Copy)]
pub struct SetItem<'a> {
    pub key: &'a str,
    pub value: Option<&'a [u8]>,
    pub plan: ExpiryPlan,
}

impl<'a> SetItem<'a> {
    /// Build the write, resolving the expiry fields at `now`.
    pub fn plan(
        key: &'a str, value: Option<&'a [u8]>, options: &EntryOptions, default_sliding: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        let plan = policy::resolve(now, options, default_sliding)?;
        Ok(Self { key, value, plan })
    }

    pub(crate) fn sql(table: &TableRef) -> String {
        format!(
            "INSERT INTO {table} (key, value, expires_at, sliding_interval, absolute_expiry)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                expires_at = EXCLUDED.expires_at,
                sliding_interval = EXCLUDED.sliding_interval,
                absolute_expiry = EXCLUDED.absolute_expiry"
        )
    }
}

impl CacheCommand for SetItem<'_> {
    type Output = bool;

    async fn execute(&self, conn: &mut PgConnection, table: &TableRef) -> Result<bool, Error> {
        tracing::debug!(
            key = self.key,
            bytes = self.value.map_or(0, <[u8]>::len),
            expires_at = ?self.plan.expires_at,
            sliding = ?self.plan.sliding_interval,
            "set item"
        );

        let sliding = self.plan.sliding_interval.map(to_interval).transpose()?;

        let sql = Self::sql(table);
        tracing::trace!(sql = %sql, "executing sql");

        let result = sqlx::query(&sql)
            .bind(self.key)
            .bind(self.value)
            .bind(self.plan.expires_at)
            .bind(sliding)
            .bind(self.plan.absolute_expiry)
            .execute(conn)
            .await?;

        let stored = result.rows_affected() == 1;
        if stored {
            tracing::debug!(key = self.key, "stored item");
        } else {
            tracing::warn!(key = self.key, rows = result.rows_affected(), "upsert affected an unexpected row count");
        }
        Ok(stored)
    }
}

/// Slide an entry's expiry forward without reading it.
///
/// Applies even to entries that have already expired but not yet been
/// purged. No-op for entries without a sliding interval.
#[derive(Debug, Clone, Copy)]
pub struct RefreshItem<'a> {
    pub key: &'a str,
}

impl RefreshItem<'_> {
    pub(crate) fn sql(table: &TableRef) -> String {
        format!(
            "UPDATE {table}
            SET expires_at = {SLIDE_EXPIRY}
            WHERE key = $1 AND sliding_interval IS NOT NULL"
        )
    }
}

impl CacheCommand for RefreshItem<'_> {
    type Output = bool;

    async fn execute(&self, conn: &mut PgConnection, table: &TableRef) -> Result<bool, Error> {
        tracing::debug!(key = self.key, "refresh item");

        let sql = Self::sql(table);
        tracing::trace!(sql = %sql, "executing sql");

        let updated = sqlx::query(&sql).bind(self.key).execute(conn).await?.rows_affected() > 0;
        if updated {
            tracing::debug!(key = self.key, "refreshed item");
        } else {
            tracing::debug!(key = self.key, "refresh found nothing to slide");
        }
        Ok(updated)
    }
}

/// Delete an entry. Idempotent.
#[derive(Debug, Clone, Copy)]
pub struct RemoveItem<'a> {
    pub key: &'a str,
}

impl CacheCommand for RemoveItem<'_> {
    type Output = bool;

    async fn execute(&self, conn: &mut PgConnection, table: &TableRef) -> Result<bool, Error> {
        tracing::debug!(key = self.key, "remove item");

        let sql = format!("DELETE FROM {table} WHERE key = $1");
        tracing::trace!(sql = %sql, "executing sql");

        let count = sqlx::query(&sql).bind(self.key).execute(conn).await?.rows_affected();
        if count == 0 {
            tracing::debug!(key = self.key, "nothing to remove");
        } else {
            tracing::debug!(key = self.key, count, "removed item");
        }
        Ok(count > 0)
    }
}

/// Non-blocking attempt at a session-scoped advisory lock.
///
/// The lock belongs to the connection's session: it is held until the
/// session ends or is explicitly unlocked.
#[derive(Debug, Clone, Copy)]
pub struct TryAcquireLock {
    pub id: i64,
}

impl CacheCommand for TryAcquireLock {
    type Output = bool;

    async fn execute(&self, conn: &mut PgConnection, _table: &TableRef) -> Result<bool, Error> {
        tracing::trace!(sql = "SELECT pg_try_advisory_lock($1)", lock_id = self.id, "executing sql");

        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
            .bind(self.id)
            .fetch_one(conn)
            .await?;

        if acquired {
            tracing::debug!(lock_id = self.id, "advisory lock acquired");
        } else {
            tracing::debug!(lock_id = self.id, "advisory lock held elsewhere");
        }
        Ok(acquired)
    }
}

/// Release every session-scoped advisory lock held by the connection.
///
/// The server releases locks on disconnect only after the client has gone,
/// so a session that must hand the lock over promptly unlocks first.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseLocks;

impl CacheCommand for ReleaseLocks {
    type Output = ();

    async fn execute(&self, conn: &mut PgConnection, _table: &TableRef) -> Result<(), Error> {
        tracing::trace!(sql = "SELECT pg_advisory_unlock_all()", "executing sql");
        sqlx::query("SELECT pg_advisory_unlock_all()").execute(conn).await?;
        tracing::debug!("advisory locks released");
        Ok(())
    }
}

pub(crate) fn to_interval(duration: Duration) -> Result<PgInterval, Error> {
    let microseconds = i64::try_from(duration.as_micros())
        .map_err(|_| Error::InvalidInput(format!("sliding interval {duration:?} is too large")))?;
    Ok(PgInterval { months: 0, days: 0, microseconds })
}

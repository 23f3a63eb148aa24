//! The four-verb cache API.
//!
//! Every call checks out one pooled connection, runs one command on it and
//! returns the connection to the pool. No connection is held between calls,
//! and no client-side locking is done: concurrent callers rely on the
//! atomicity of each statement.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::commands::{CacheCommand, GetItem, Lookup, RefreshItem, RemoveItem, SetItem, run_cancellable};
use super::connection::CacheDb;
use super::lock::SweepOutcome;
use super::migrations;
use super::policy::EntryOptions;
use crate::Error;
use crate::config::CacheConfig;

/// PostgreSQL-backed distributed cache.
#[derive(Clone, Debug)]
pub struct PgCache {
    db: CacheDb,
    default_sliding: Option<Duration>,
    cleanup_lock_id: i64,
    purge_batch_limit: i64,
}

impl PgCache {
    /// Validate `config`, open the pool and provision the table.
    pub async fn connect(config: &CacheConfig) -> Result<Self, Error> {
        config.validate()?;
        let db = CacheDb::connect(config).await?;
        migrations::provision(&db, config.create_infrastructure).await?;
        Ok(Self::new(db, config))
    }

    /// Wrap an already provisioned database.
    pub fn new(db: CacheDb, config: &CacheConfig) -> Self {
        Self {
            db,
            default_sliding: config.default_sliding(),
            cleanup_lock_id: config.cleanup_lock_id,
            purge_batch_limit: config.purge_batch_limit,
        }
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// Read a live entry, sliding its expiry when configured.
    pub async fn get(&self, key: &str) -> Result<Lookup, Error> {
        self.get_with_cancel(key, &CancellationToken::new()).await
    }

    pub async fn get_with_cancel(&self, key: &str, cancel: &CancellationToken) -> Result<Lookup, Error> {
        check_key(key)?;
        self.call(GetItem { key }, cancel).await
    }

    /// Insert or replace an entry. A `None` value is stored as a null payload.
    pub async fn set(&self, key: &str, value: Option<&[u8]>, options: &EntryOptions) -> Result<bool, Error> {
        self.set_with_cancel(key, value, options, &CancellationToken::new()).await
    }

    pub async fn set_with_cancel(
        &self, key: &str, value: Option<&[u8]>, options: &EntryOptions, cancel: &CancellationToken,
    ) -> Result<bool, Error> {
        check_key(key)?;
        let command = SetItem::plan(key, value, options, self.default_sliding, Utc::now())?;
        self.call(command, cancel).await
    }

    /// Slide an entry's expiry forward. Returns whether a row was updated.
    pub async fn refresh(&self, key: &str) -> Result<bool, Error> {
        self.refresh_with_cancel(key, &CancellationToken::new()).await
    }

    pub async fn refresh_with_cancel(&self, key: &str, cancel: &CancellationToken) -> Result<bool, Error> {
        check_key(key)?;
        self.call(RefreshItem { key }, cancel).await
    }

    /// Delete an entry. Returns whether a row existed.
    pub async fn remove(&self, key: &str) -> Result<bool, Error> {
        self.remove_with_cancel(key, &CancellationToken::new()).await
    }

    pub async fn remove_with_cancel(&self, key: &str, cancel: &CancellationToken) -> Result<bool, Error> {
        check_key(key)?;
        self.call(RemoveItem { key }, cancel).await
    }

    /// Run one cleanup tick immediately, under the same lock as the scheduler.
    pub async fn sweep_now(&self, cancel: &CancellationToken) -> Result<SweepOutcome, Error> {
        self.db.sweep(self.cleanup_lock_id, self.purge_batch_limit, cancel).await
    }

    async fn call<C: CacheCommand>(&self, command: C, cancel: &CancellationToken) -> Result<C::Output, Error> {
        run_cancellable(cancel, async {
            let mut conn = self.db.acquire().await?;
            command.execute(&mut *conn, self.db.table()).await
        })
        .await
    }
}

fn check_key(key: &str) -> Result<(), Error> {
    if key.is_empty() {
        return Err(Error::InvalidInput("key must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_key() {
        assert!(check_key("a").is_ok());
        assert!(matches!(check_key(""), Err(Error::InvalidInput(_))));
    }
}

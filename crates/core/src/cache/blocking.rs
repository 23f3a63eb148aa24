//! Synchronous wrapper over [`PgCache`].
//!
//! Each method blocks on the matching async call using a runtime owned by the
//! wrapper. Do not use it from inside an async context: blocking on a runtime
//! from within another panics.

use tokio::runtime::{Builder, Runtime};

use super::commands::Lookup;
use super::facade::PgCache;
use super::policy::EntryOptions;
use crate::Error;
use crate::config::CacheConfig;

/// Blocking handle to the cache.
#[derive(Debug)]
pub struct BlockingCache {
    inner: PgCache,
    rt: Runtime,
}

impl BlockingCache {
    /// Build a private runtime and connect on it.
    pub fn connect(config: &CacheConfig) -> Result<Self, Error> {
        let rt = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("pgcache-blocking")
            .enable_all()
            .build()
            .map_err(Error::Runtime)?;

        let inner = rt.block_on(PgCache::connect(config))?;
        Ok(Self { inner, rt })
    }

    /// The async cache this wrapper drives.
    pub fn as_async(&self) -> &PgCache {
        &self.inner
    }

    pub fn get(&self, key: &str) -> Result<Lookup, Error> {
        self.rt.block_on(self.inner.get(key))
    }

    pub fn set(&self, key: &str, value: Option<&[u8]>, options: &EntryOptions) -> Result<bool, Error> {
        self.rt.block_on(self.inner.set(key, value, options))
    }

    pub fn refresh(&self, key: &str) -> Result<bool, Error> {
        self.rt.block_on(self.inner.refresh(key))
    }

    pub fn remove(&self, key: &str) -> Result<bool, Error> {
        self.rt.block_on(self.inner.remove(key))
    }
}

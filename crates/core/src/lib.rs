//! Core types and shared functionality for pgcache.
//!
//! This crate provides:
//! - A distributed cache with PostgreSQL backend
//! - Unified error types
//! - Layered configuration

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{BlockingCache, CacheDb, EntryOptions, Lookup, PgCache, PurgeReport, SweepOutcome};
pub use config::CacheConfig;
pub use error::Error;

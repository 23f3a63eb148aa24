//! PostgreSQL-backed distributed cache.
//!
//! Entries live in a single table keyed by string, with an optional byte
//! payload and expiry metadata. This module provides:
//!
//! - Expiry planning for absolute and sliding entries
//! - One command type per cache verb, each a single SQL statement
//! - Batched, cancellable purging of expired rows
//! - A background cleanup loop coordinated across instances by an advisory lock
//! - Async and blocking front ends

pub mod blocking;
pub mod commands;
pub mod connection;
pub mod facade;
pub mod lock;
pub mod migrations;
pub mod policy;
pub mod purge;
pub mod scheduler;
pub mod table;

pub use crate::Error;

pub use blocking::BlockingCache;
pub use commands::{CacheCommand, Lookup};
pub use connection::CacheDb;
pub use facade::PgCache;
pub use lock::{LockSession, SweepOutcome};
pub use policy::{EntryOptions, ExpiryPlan};
pub use purge::PurgeReport;
pub use scheduler::{CleanupHandle, CleanupScheduler, CleanupState, CleanupTarget, PgCleanup};
pub use table::TableRef;

//! Background cleanup loop.
//!
//! One long-lived task per process wakes on a fixed interval, tries the
//! cleanup advisory lock and purges expired rows only when it gets the lock,
//! so at most one instance in a fleet purges at a time.
//!
//! ```text
//! Idle -> AttemptingLock -> Purging -> Sleeping -> AttemptingLock ...
//!                        \-> Skipped -/
//! ```
//!
//! A failed tick is logged and the loop moves on to `Sleeping`; only the
//! cancellation token stops it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::commands::run_cancellable;
use super::connection::CacheDb;
use super::lock::{LockSession, SweepOutcome};
use super::purge::PurgeReport;
use crate::Error;
use crate::config::CacheConfig;

/// Where the cleanup loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupState {
    Idle,
    AttemptingLock,
    Purging,
    Skipped,
    Sleeping,
    Stopped,
}

/// Lock-then-purge operations the cleanup loop drives.
pub trait CleanupTarget: Send + Sync + 'static {
    /// Proof of holding the cleanup lock. Dropping it must release the lock.
    type Session: Send;

    /// Try the cleanup lock; `None` when another instance holds it.
    fn try_lock(
        &self, cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Option<Self::Session>, Error>> + Send;

    fn purge(
        &self, session: &mut Self::Session, cancel: &CancellationToken,
    ) -> impl Future<Output = Result<PurgeReport, Error>> + Send;

    /// Release the lock by ending the session.
    fn release(&self, session: Self::Session) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Production cleanup target: PostgreSQL advisory lock plus batched purge.
#[derive(Debug, Clone)]
pub struct PgCleanup {
    db: CacheDb,
    lock_id: i64,
    batch_limit: i64,
}

impl PgCleanup {
    pub fn new(db: CacheDb, lock_id: i64, batch_limit: i64) -> Self {
        Self { db, lock_id, batch_limit }
    }

    pub fn from_config(db: CacheDb, config: &CacheConfig) -> Self {
        Self::new(db, config.cleanup_lock_id, config.purge_batch_limit)
    }
}

impl CleanupTarget for PgCleanup {
    type Session = LockSession;

    async fn try_lock(&self, cancel: &CancellationToken) -> Result<Option<LockSession>, Error> {
        let mut session = run_cancellable(cancel, LockSession::open(&self.db)).await?;

        if run_cancellable(cancel, session.try_acquire(self.lock_id)).await? {
            Ok(Some(session))
        } else {
            session.close().await?;
            Ok(None)
        }
    }

    async fn purge(&self, session: &mut LockSession, cancel: &CancellationToken) -> Result<PurgeReport, Error> {
        session.purge(self.batch_limit, cancel).await
    }

    async fn release(&self, session: LockSession) -> Result<(), Error> {
        session.close().await
    }
}

/// Run a single tick against `target`, reporting state transitions to `state`.
///
/// The session is released even when the purge fails.
pub async fn run_tick<T: CleanupTarget>(
    target: &T, cancel: &CancellationToken, state: Option<&watch::Sender<CleanupState>>,
) -> Result<SweepOutcome, Error> {
    let enter = |next: CleanupState| {
        if let Some(tx) = state {
            tx.send_replace(next);
        }
    };

    enter(CleanupState::AttemptingLock);
    let Some(mut session) = target.try_lock(cancel).await? else {
        enter(CleanupState::Skipped);
        return Ok(SweepOutcome::Skipped);
    };

    enter(CleanupState::Purging);
    let purged = target.purge(&mut session, cancel).await;
    let released = target.release(session).await;

    let report = purged?;
    released?;
    Ok(SweepOutcome::Purged(report))
}

impl CacheDb {
    /// Run one cleanup tick now: take the lock on a fresh session, purge if
    /// it was granted, then end the session.
    pub async fn sweep(&self, lock_id: i64, limit: i64, cancel: &CancellationToken) -> Result<SweepOutcome, Error> {
        run_tick(&PgCleanup::new(self.clone(), lock_id, limit), cancel, None).await
    }
}

/// Periodic cleanup loop over a [`CleanupTarget`].
#[derive(Debug)]
pub struct CleanupScheduler<T> {
    target: T,
    interval: Duration,
}

impl<T: CleanupTarget> CleanupScheduler<T> {
    pub fn new(target: T, interval: Duration) -> Self {
        Self { target, interval }
    }

    /// Spawn the loop on the current runtime.
    ///
    /// The loop stops when `cancel` (or the handle's own token, a child of it)
    /// is cancelled.
    pub fn spawn(self, cancel: &CancellationToken) -> CleanupHandle {
        let cancel = cancel.child_token();
        let (state_tx, state_rx) = watch::channel(CleanupState::Idle);

        let join = tokio::spawn({
            let cancel = cancel.clone();
            async move { self.run(&cancel, &state_tx).await }
        });

        CleanupHandle { cancel, join, state: state_rx }
    }

    /// Drive the loop until `cancel` fires.
    pub async fn run(self, cancel: &CancellationToken, state: &watch::Sender<CleanupState>) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "cleanup scheduler started");

        loop {
            match run_tick(&self.target, cancel, Some(state)).await {
                Ok(SweepOutcome::Purged(report)) => {
                    tracing::debug!(deleted = report.deleted, cancelled = report.cancelled, "cleanup tick purged");
                }
                Ok(SweepOutcome::Skipped) => {
                    tracing::debug!("cleanup tick skipped; lock held elsewhere");
                }
                Err(e) if e.is_cancelled() && cancel.is_cancelled() => break,
                Err(e) => {
                    tracing::error!(error = %e, "cleanup tick failed");
                }
            }

            state.send_replace(CleanupState::Sleeping);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        state.send_replace(CleanupState::Stopped);
        tracing::info!("cleanup scheduler stopped");
    }
}

/// Handle to a spawned cleanup loop.
#[derive(Debug)]
pub struct CleanupHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
    state: watch::Receiver<CleanupState>,
}

impl CleanupHandle {
    /// Most recent state the loop reported.
    pub fn state(&self) -> CleanupState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<CleanupState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signal the loop to stop and wait for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "cleanup task ended abnormally");
        }
    }
}

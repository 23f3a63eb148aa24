//! Expiration policy.
//!
//! Computes the three expiry fields persisted with an entry from the
//! requested [`EntryOptions`], the current time and the configured default
//! sliding interval. Pure and deterministic: callers supply `now`.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::Error;

/// Finest interval the database stores.
const MIN_SLIDING: Duration = Duration::from_micros(1);

/// Per-entry expiration request. Any subset may be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Fixed instant after which the entry is always expired.
    pub absolute_expiration: Option<DateTime<Utc>>,
    /// Absolute expiration expressed as an offset from the time of the write.
    pub absolute_expiration_relative_to_now: Option<Duration>,
    /// Extension applied on every qualifying read.
    pub sliding_expiration: Option<Duration>,
}

impl EntryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_absolute_expiration(mut self, at: DateTime<Utc>) -> Self {
        self.absolute_expiration = Some(at);
        self
    }

    pub fn with_absolute_expiration_relative_to_now(mut self, ttl: Duration) -> Self {
        self.absolute_expiration_relative_to_now = Some(ttl);
        self
    }

    pub fn with_sliding_expiration(mut self, interval: Duration) -> Self {
        self.sliding_expiration = Some(interval);
        self
    }

    /// Reject zero durations, and sliding intervals too short to store.
    pub fn validate(&self) -> Result<(), Error> {
        if self.absolute_expiration_relative_to_now.is_some_and(|d| d.is_zero()) {
            return Err(Error::InvalidInput("relative absolute expiration must be positive".into()));
        }
        if self.sliding_expiration.is_some_and(|d| d < MIN_SLIDING) {
            return Err(Error::InvalidInput("sliding expiration must be at least one microsecond".into()));
        }
        Ok(())
    }
}

/// Expiry fields to persist for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPlan {
    pub expires_at: Option<DateTime<Utc>>,
    pub sliding_interval: Option<Duration>,
    pub absolute_expiry: Option<DateTime<Utc>>,
}

impl ExpiryPlan {
    /// Neither expires nor slides.
    pub fn is_permanent(&self) -> bool {
        self.expires_at.is_none() && self.sliding_interval.is_none()
    }
}

/// Resolve the expiry fields for a write at `now`.
///
/// Absolute: explicit instant, else `now + relative`, else (only when the
/// entry requests no sliding interval) `now + default_sliding`, else none.
/// Sliding: requested interval, else `default_sliding`, else none.
/// `expires_at` is the absolute value when nothing slides, otherwise
/// `now + sliding` capped at the absolute value.
pub fn resolve(
    now: DateTime<Utc>, options: &EntryOptions, default_sliding: Option<Duration>,
) -> Result<ExpiryPlan, Error> {
    options.validate()?;

    let absolute = match (options.absolute_expiration, options.absolute_expiration_relative_to_now) {
        (Some(at), _) => Some(at),
        (None, Some(ttl)) => Some(offset(now, ttl)?),
        (None, None) => match (options.sliding_expiration, default_sliding) {
            (None, Some(fallback)) => Some(offset(now, fallback)?),
            _ => None,
        },
    };

    let sliding = options.sliding_expiration.or(default_sliding);

    let expires_at = match sliding {
        None => absolute,
        Some(interval) => {
            let candidate = offset(now, interval)?;
            Some(absolute.map_or(candidate, |ceiling| candidate.min(ceiling)))
        }
    };

    Ok(ExpiryPlan { expires_at, sliding_interval: sliding, absolute_expiry: absolute })
}

fn offset(now: DateTime<Utc>, by: Duration) -> Result<DateTime<Utc>, Error> {
    TimeDelta::from_std(by)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| Error::InvalidInput(format!("expiration offset {by:?} is out of range")))
}

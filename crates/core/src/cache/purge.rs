//! Batched deletion of expired rows.
//!
//! Each batch is its own statement and commits on its own. Stopping between
//! batches, whether by cancellation or by running out of rows, never undoes
//! earlier batches.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tokio_util::sync::CancellationToken;

use super::commands::{CacheCommand, run_cancellable};
use super::table::TableRef;
use crate::Error;

/// Outcome of one purge run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PurgeReport {
    /// Rows deleted across all batches.
    pub deleted: u64,
    /// Batches that deleted at least one row.
    pub batches: u64,
    /// Whether the run stopped on cancellation rather than an empty batch.
    pub cancelled: bool,
}

/// Delete expired rows in batches of at most `limit` until a batch comes back empty.
#[derive(Debug, Clone, Copy)]
pub struct PurgeExpired<'a> {
    pub limit: i64,
    pub cancel: &'a CancellationToken,
}

impl PurgeExpired<'_> {
    /// Rows are picked by `ctid` so the `LIMIT` bounds each statement.
    pub(crate) fn sql(table: &TableRef) -> String {
        format!(
            "DELETE FROM {table}
            WHERE ctid IN (
                SELECT ctid FROM {table}
                WHERE expires_at <= now()
                LIMIT $1
            )"
        )
    }
}

impl CacheCommand for PurgeExpired<'_> {
    type Output = PurgeReport;

    async fn execute(&self, conn: &mut PgConnection, table: &TableRef) -> Result<PurgeReport, Error> {
        if self.limit <= 0 {
            return Err(Error::InvalidInput("purge batch limit must be positive".into()));
        }

        tracing::debug!(limit = self.limit, "starting purge of expired items");

        let sql = Self::sql(table);
        let mut report = PurgeReport::default();

        loop {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            tracing::trace!(sql = %sql, "executing sql");

            let batch = run_cancellable(self.cancel, async {
                Ok(sqlx::query(&sql).bind(self.limit).execute(&mut *conn).await?.rows_affected())
            })
            .await;

            let count = match batch {
                Ok(0) => break,
                Ok(count) => count,
                Err(Error::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(e) => return Err(e),
            };

            report.deleted += count;
            report.batches += 1;
            tracing::trace!(count, "deleted expired items in batch");
        }

        if report.cancelled {
            tracing::debug!(deleted = report.deleted, "purge cancelled");
        } else {
            tracing::info!(deleted = report.deleted, batches = report.batches, "finished purge");
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purge_sql_is_bounded() {
        let sql = PurgeExpired::sql(&TableRef::new(None, "cache_items"));
        assert!(sql.starts_with("DELETE FROM \"cache_items\""));
        assert!(sql.contains("expires_at <= now()"));
        assert!(sql.contains("LIMIT $1"));
    }

    #[test]
    fn test_report_default() {
        let report = PurgeReport::default();
        assert_eq!(report.deleted, 0);
        assert_eq!(report.batches, 0);
        assert!(!report.cancelled);
    }
}

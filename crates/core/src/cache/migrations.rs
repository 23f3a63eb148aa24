//! Cache table provisioning.
//!
//! Creates the schema (when one is configured), the cache table and its
//! `expires_at` index. Every statement is `IF NOT EXISTS`, so running it
//! against an already provisioned database is a no-op. It runs once at
//! startup, before any cache call or cleanup tick.

use super::connection::CacheDb;
use super::table::TableRef;
use crate::Error;

/// DDL for the cache table.
///
/// The table is `UNLOGGED`, so its rows do not survive a server crash.
pub fn ddl(table: &TableRef) -> String {
    let mut sql = String::new();

    if let Some(schema) = table.quoted_schema() {
        sql.push_str(&format!("CREATE SCHEMA IF NOT EXISTS {schema};\n"));
    }

    sql.push_str(&format!(
        "CREATE UNLOGGED TABLE IF NOT EXISTS {table} (
            key TEXT NOT NULL PRIMARY KEY,
            value BYTEA NULL,
            expires_at TIMESTAMPTZ NULL,
            sliding_interval INTERVAL NULL,
            absolute_expiry TIMESTAMPTZ NULL
        );
        CREATE INDEX IF NOT EXISTS {index} ON {table} (expires_at);",
        index = table.expiry_index(),
    ));

    sql
}

/// Provision the cache table if `enabled`.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` if the DDL fails to execute.
pub async fn provision(db: &CacheDb, enabled: bool) -> Result<(), Error> {
    if !enabled {
        tracing::info!(table = %db.table(), "skipping cache table provisioning");
        return Ok(());
    }

    tracing::info!(table = %db.table(), "provisioning cache table");

    let sql = ddl(db.table());
    tracing::trace!(sql = %sql, "executing sql");

    let mut conn = db.acquire().await?;
    sqlx::raw_sql(&sql)
        .execute(&mut *conn)
        .await
        .map_err(|e| Error::MigrationFailed(e.to_string()))?;

    tracing::info!(table = %db.table(), "cache table ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddl_without_schema() {
        let sql = ddl(&TableRef::new(None, "cache_items"));
        assert!(!sql.contains("CREATE SCHEMA"));
        assert!(sql.contains("CREATE UNLOGGED TABLE IF NOT EXISTS \"cache_items\""));
        assert!(sql.contains("CREATE INDEX IF NOT EXISTS \"cache_items_expires_at\" ON \"cache_items\" (expires_at)"));
    }

    #[test]
    fn test_ddl_with_schema() {
        let sql = ddl(&TableRef::new(Some("cache"), "items"));
        assert!(sql.starts_with("CREATE SCHEMA IF NOT EXISTS \"cache\";"));
        assert!(sql.contains("\"cache\".\"items\""));
    }

    #[test]
    fn test_ddl_value_is_nullable() {
        let sql = ddl(&TableRef::new(None, "cache_items"));
        assert!(sql.contains("value BYTEA NULL"));
        assert!(sql.contains("key TEXT NOT NULL PRIMARY KEY"));
    }
}

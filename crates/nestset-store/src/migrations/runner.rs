use std::collections::HashMap;

use rusqlite::Connection;

use super::embedded::{Migration, MIGRATIONS};
use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};

const LEDGER: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    migration_id TEXT PRIMARY KEY,
    checksum TEXT NOT NULL,
    applied_at INTEGER NOT NULL
)";

/// Bring the schema up to date
///
/// Every embedded migration already in the `schema_version` ledger must
/// still match its recorded checksum. The pending ones run in order inside
/// one transaction, so a failure leaves the schema where it was. Returns
/// the ids applied by this call.
///
/// # Errors
///
/// Returns `StoreUnavailable` if a migration fails or an applied migration
/// was edited after the fact.
pub fn apply_migrations(conn: &mut Connection) -> Result<Vec<&'static str>> {
    conn.execute(LEDGER, []).map_err(from_rusqlite)?;
    let recorded = recorded_checksums(conn)?;

    let mut pending: Vec<&Migration> = Vec::new();
    for migration in MIGRATIONS {
        match recorded.get(migration.id) {
            Some(previous) if *previous != migration.checksum() => {
                return Err(checksum_mismatch(migration.id, previous, &migration.checksum()));
            }
            Some(_) => {}
            None => pending.push(migration),
        }
    }

    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let tx = conn.transaction().map_err(from_rusqlite)?;
    let now = chrono::Utc::now().timestamp();
    for migration in &pending {
        tx.execute_batch(migration.sql)
            .map_err(|e| migration_error(migration.id, &e.to_string()))?;
        tx.execute(
            "INSERT INTO schema_version (migration_id, checksum, applied_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![migration.id, migration.checksum(), now],
        )
        .map_err(from_rusqlite)?;
    }
    tx.commit().map_err(from_rusqlite)?;

    let applied: Vec<_> = pending.iter().map(|m| m.id).collect();
    tracing::debug!(applied = ?applied, "schema migrated");
    Ok(applied)
}

fn recorded_checksums(conn: &Connection) -> Result<HashMap<String, String>> {
    let mut stmt = conn
        .prepare("SELECT migration_id, checksum FROM schema_version")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(from_rusqlite)?;
    let checksums = rows
        .collect::<rusqlite::Result<HashMap<String, String>>>()
        .map_err(from_rusqlite)?;
    Ok(checksums)
}

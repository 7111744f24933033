//! SQLite connections for the document store

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::errors::{from_rusqlite, Result};

/// Lock wait before a write fails with `SQLITE_BUSY`
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a database file, creating it if missing
///
/// File databases run in WAL mode so readers in other processes do not
/// block a rebuild's commit.
///
/// # Errors
///
/// Returns `StoreUnavailable` if the file cannot be opened or configured.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let conn = Connection::open(path).map_err(from_rusqlite)?;
    conn.busy_timeout(BUSY_TIMEOUT).map_err(from_rusqlite)?;
    // journal_mode answers with a row, which `execute` rejects
    conn.execute_batch("PRAGMA journal_mode = WAL;")
        .map_err(from_rusqlite)?;
    Ok(conn)
}

/// Private in-memory database
///
/// # Errors
///
/// Returns `StoreUnavailable` if SQLite cannot allocate the database.
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

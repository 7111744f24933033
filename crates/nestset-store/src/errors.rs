//! Error helpers for nestset-store
//!
//! Store failures surface as `TreeError::StoreUnavailable` so that callers
//! of the core traits see a single error type.

use nestset_core::errors::TreeError;

/// Result type alias shared with nestset-core
pub type Result<T> = nestset_core::errors::Result<T>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> TreeError {
    TreeError::store(
        "migration",
        format!("Migration {} failed: {}", migration_id, reason),
    )
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> TreeError {
    TreeError::store(
        "migration_checksum",
        format!(
            "Checksum mismatch for migration {}: recorded {}, embedded {}",
            migration_id, expected, actual
        ),
    )
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> TreeError {
    TreeError::store("sqlite", err)
}

/// Create a body decoding error for one stored document
pub fn corrupt_body(id: &str, err: serde_json::Error) -> TreeError {
    TreeError::Serialization {
        message: format!("document {} has an unreadable body: {}", id, err),
    }
}

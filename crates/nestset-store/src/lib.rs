//! nestset store - SQLite persistence for nestset trees
//!
//! Provides:
//! - Connection helpers (WAL and busy timeout for file databases)
//! - Embedded SQL migrations recorded with checksums
//! - A [`DocumentStore`](nestset_core::DocumentStore) over a JSON document
//!   table, with transactional coordinate commits

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use repo::SqliteDocumentStore;

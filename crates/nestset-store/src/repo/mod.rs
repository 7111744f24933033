//! Repository layer persisting tree documents to SQLite

pub mod sql_filter;
pub mod sqlite_store;

pub use sqlite_store::SqliteDocumentStore;

//! SQLite-backed document store
//!
//! Documents of one collection live as JSON bodies in the shared
//! `documents` table. The autoincrement `seq` column is the store-native
//! order; coordinate commits run in a single transaction.

use std::path::Path;

use nestset_core::errors::{Result, TreeError};
use nestset_core::model::{DocId, Document, Fields, Filter, FindOptions};
use nestset_core::DocumentStore;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

use super::sql_filter::{order_clause, where_clause};
use crate::db;
use crate::errors::{corrupt_body, from_rusqlite};
use crate::migrations::apply_migrations;

/// Document store over one collection of a SQLite database
#[derive(Debug)]
pub struct SqliteDocumentStore {
    conn: Connection,
    collection: String,
}

impl SqliteDocumentStore {
    /// Open (creating if needed) a database file and migrate it
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the file cannot be opened or migrated.
    pub fn open<P: AsRef<Path>>(path: P, collection: impl Into<String>) -> Result<Self> {
        Self::from_connection(db::open(path)?, collection)
    }

    /// Fresh in-memory database (for testing)
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if SQLite cannot allocate the database.
    pub fn open_in_memory(collection: impl Into<String>) -> Result<Self> {
        Self::from_connection(db::open_in_memory()?, collection)
    }

    /// Wrap an existing connection, applying pending migrations
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if a migration fails.
    pub fn from_connection(mut conn: Connection, collection: impl Into<String>) -> Result<Self> {
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn,
            collection: collection.into(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Number of documents in this collection
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` on SQLite failure.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?",
                [&self.collection],
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn encode(fields: &Fields) -> Result<String> {
    Ok(serde_json::to_string(fields)?)
}

fn decode(id: &str, body: &str) -> Result<Fields> {
    serde_json::from_str(body).map_err(|e| corrupt_body(id, e))
}

impl DocumentStore for SqliteDocumentStore {
    fn insert(&mut self, fields: Fields) -> Result<DocId> {
        let id = DocId::generate();
        let now = chrono::Utc::now().timestamp();

        self.conn
            .execute(
                "INSERT INTO documents (id, collection, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                rusqlite::params![id.as_str(), self.collection, encode(&fields)?, now],
            )
            .map_err(from_rusqlite)?;

        Ok(id)
    }

    fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>> {
        let mut params = vec![rusqlite::types::Value::Text(self.collection.clone())];
        let condition = where_clause(filter, &mut params)?;
        let order = order_clause(options)?;
        params.push(rusqlite::types::Value::Integer(
            options.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX)),
        ));
        params.push(rusqlite::types::Value::Integer(
            options.skip.map_or(0, |s| i64::try_from(s).unwrap_or(i64::MAX)),
        ));

        let sql = format!(
            "SELECT id, body FROM documents
             WHERE collection = ? AND ({})
             ORDER BY {}
             LIMIT ? OFFSET ?",
            condition, order
        );

        let mut stmt = self.conn.prepare(&sql).map_err(from_rusqlite)?;
        let rows: Vec<(String, String)> = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        rows.into_iter()
            .map(|(id, body)| {
                let fields = decode(&id, &body)?;
                Ok(Document::new(DocId::new(id), fields))
            })
            .collect()
    }

    fn update(&mut self, id: &DocId, fields: &Fields) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE documents SET body = ?1, updated_at = ?2
                 WHERE collection = ?3 AND id = ?4",
                rusqlite::params![
                    encode(fields)?,
                    chrono::Utc::now().timestamp(),
                    self.collection,
                    id.as_str()
                ],
            )
            .map_err(from_rusqlite)?;

        if changed == 0 {
            return Err(TreeError::NodeNotFound { id: id.to_string() });
        }
        Ok(())
    }

    fn remove(&mut self, filter: &Filter, single: bool) -> Result<usize> {
        let mut params = vec![rusqlite::types::Value::Text(self.collection.clone())];
        let condition = where_clause(filter, &mut params)?;

        let sql = if single {
            format!(
                "DELETE FROM documents WHERE seq IN (
                    SELECT seq FROM documents
                    WHERE collection = ? AND ({})
                    ORDER BY seq LIMIT 1
                 )",
                condition
            )
        } else {
            format!(
                "DELETE FROM documents WHERE collection = ? AND ({})",
                condition
            )
        };

        self.conn
            .execute(&sql, params_from_iter(params.iter()))
            .map_err(from_rusqlite)
    }

    /// Merges every patch inside one transaction; any failure rolls the
    /// whole generation back.
    fn apply_patches(&mut self, patches: &[(DocId, Fields)]) -> Result<()> {
        let tx = self.conn.transaction().map_err(from_rusqlite)?;
        let now = chrono::Utc::now().timestamp();

        {
            let mut select = tx
                .prepare_cached("SELECT body FROM documents WHERE collection = ?1 AND id = ?2")
                .map_err(from_rusqlite)?;
            let mut write = tx
                .prepare_cached(
                    "UPDATE documents SET body = ?1, updated_at = ?2
                     WHERE collection = ?3 AND id = ?4",
                )
                .map_err(from_rusqlite)?;

            for (id, patch) in patches {
                let body: String = select
                    .query_row(rusqlite::params![self.collection, id.as_str()], |row| {
                        row.get(0)
                    })
                    .optional()
                    .map_err(from_rusqlite)?
                    .ok_or_else(|| TreeError::NodeNotFound { id: id.to_string() })?;

                let mut doc = Document::new(id.clone(), decode(id.as_str(), &body)?);
                doc.merge(patch);

                write
                    .execute(rusqlite::params![
                        encode(&doc.fields)?,
                        now,
                        self.collection,
                        id.as_str()
                    ])
                    .map_err(from_rusqlite)?;
            }
        }

        tx.commit().map_err(from_rusqlite)?;
        tracing::debug!(patches = patches.len(), "coordinate generation committed");
        Ok(())
    }
}

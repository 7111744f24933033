//! Mutation gateway
//!
//! Every write to the tree goes through here: the gateway fills in the
//! topology defaults, checks the write guards, forwards the raw write to
//! the store and reindexes the whole tree before returning.

use std::collections::HashSet;
use std::time::Instant;

use serde_json::Value;

use crate::config::TreeConfig;
use crate::errors::{Result, TreeError};
use crate::model::{
    is_empty_ref, key_label, match_key, Coordinates, DocId, Fields, Filter, FindOptions, Node,
};
use crate::ops::store::DocumentStore;
use crate::queries::TreeQueryEngine;
use crate::rules::check_invariants;
use crate::traversal::{RebuildReport, TreeIndexer};
use crate::{log_op_end, log_op_error, log_op_start};

/// Format of the optional insert/update timestamp columns
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Owns a document store and keeps its nested-set index current
///
/// Mutations take `&mut self`: one gateway admits one writer at a time.
/// Share it across threads through [`SharedTree`](crate::ops::SharedTree).
#[derive(Debug)]
pub struct MutationGateway<S: DocumentStore> {
    store: S,
    config: TreeConfig,
}

impl<S: DocumentStore> MutationGateway<S> {
    /// Bind a store to a validated tree configuration
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration does not validate.
    pub fn new(store: S, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Query engine reading from this gateway's store
    pub fn queries(&self) -> TreeQueryEngine<'_, S> {
        TreeQueryEngine::new(&self.store, &self.config)
    }

    /// Insert a node and reindex
    ///
    /// Coordinates start as the placeholder `(0, 0, 0)` whatever the caller
    /// passed; a missing or empty parent reference becomes the root value.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` - the primary key is missing, reads as an empty
    ///   reference or equals the root value
    /// * `DuplicateKey` - another node already uses the primary key
    /// * `CycleDetected` - the node names itself as parent
    /// * `StoreUnavailable` - the insert or the rebuild failed
    pub fn create(&mut self, fields: Fields) -> Result<DocId> {
        log_op_start!("create");
        let start = Instant::now();

        let id = self.create_impl(fields).map_err(|e| {
            log_op_error!(
                "create",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "create",
            duration_ms = start.elapsed().as_millis() as u64,
            doc_id = %id
        );
        Ok(id)
    }

    fn create_impl(&mut self, mut fields: Fields) -> Result<DocId> {
        let key = fields
            .get(&self.config.primary_column)
            .cloned()
            .unwrap_or(Value::Null);
        self.check_key(&key)?;
        if self.find_by_key(&key)?.is_some() {
            return Err(TreeError::DuplicateKey {
                key: key_label(&key),
            });
        }

        let parent_column = self.config.parent_column.clone();
        if fields.get(&parent_column).map_or(true, is_empty_ref) {
            fields.insert(parent_column.clone(), self.config.root_value.clone());
        }
        if let Some(parent) = fields.get(&parent_column) {
            if match_key(parent) == match_key(&key) {
                return Err(TreeError::CycleDetected {
                    key: key_label(&key),
                    parent: key_label(parent),
                });
            }
        }
        fields.extend(Coordinates::PLACEHOLDER.to_fields(&self.config));

        let now = timestamp();
        if let Some(column) = &self.config.date_insert_column {
            fields.insert(column.clone(), Value::from(now.clone()));
        }
        if let Some(column) = &self.config.date_update_column {
            fields.insert(column.clone(), Value::from(now));
        }

        let id = self.store.insert(fields)?;
        tracing::debug!(doc_id = %id, node_key = %key_label(&key), "node inserted");

        self.rebuild()?;
        Ok(id)
    }

    /// Merge `fields` into an existing node and reindex
    ///
    /// Coordinate fields in `fields` are ignored. An empty parent reference
    /// becomes the root value.
    ///
    /// # Errors
    ///
    /// * `NodeNotFound` - no document has this identity
    /// * `InvalidInput` - the new primary key is empty or the root value
    /// * `DuplicateKey` - the new primary key belongs to another node
    /// * `CycleDetected` - the new parent is the node itself or below it
    /// * `StoreUnavailable` - the write or the rebuild failed
    pub fn update(&mut self, id: &DocId, fields: Fields) -> Result<()> {
        log_op_start!("update", doc_id = %id);
        let start = Instant::now();

        self.update_impl(id, fields).map_err(|e| {
            log_op_error!(
                "update",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                doc_id = %id
            );
            e
        })?;

        log_op_end!(
            "update",
            duration_ms = start.elapsed().as_millis() as u64,
            doc_id = %id
        );
        Ok(())
    }

    fn update_impl(&mut self, id: &DocId, mut fields: Fields) -> Result<()> {
        let mut current = self
            .store
            .find_one(&Filter::Id(id.clone()))?
            .ok_or_else(|| TreeError::NodeNotFound { id: id.to_string() })?;

        for column in self.config.coordinate_columns() {
            fields.remove(column);
        }

        let parent_column = &self.config.parent_column;
        if fields.get(parent_column).is_some_and(is_empty_ref) {
            fields.insert(parent_column.clone(), self.config.root_value.clone());
        }

        let key = match fields.get(&self.config.primary_column) {
            Some(new_key) => {
                self.check_key(new_key)?;
                let taken = self
                    .find_all_by_key(new_key)?
                    .into_iter()
                    .any(|node| &node.id != id);
                if taken {
                    return Err(TreeError::DuplicateKey {
                        key: key_label(new_key),
                    });
                }
                new_key.clone()
            }
            None => current
                .get(&self.config.primary_column)
                .cloned()
                .unwrap_or(Value::Null),
        };

        if let Some(parent) = fields.get(parent_column) {
            self.check_no_cycle(id, &key, parent)?;
        }

        current.merge(&fields);
        if let Some(column) = &self.config.date_update_column {
            current
                .fields
                .insert(column.clone(), Value::from(timestamp()));
        }

        self.store.update(id, &current.fields)?;
        self.rebuild()?;
        Ok(())
    }

    /// Delete the first (`single`) or every matching node and reindex
    ///
    /// Children of removed nodes are kept as they are; they drop out of the
    /// tree and carry placeholder coordinates after the rebuild.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the delete or the rebuild failed.
    pub fn remove(&mut self, filter: &Filter, single: bool) -> Result<usize> {
        log_op_start!("remove", single = single);
        let start = Instant::now();

        let removed = self.remove_impl(filter, single).map_err(|e| {
            log_op_error!(
                "remove",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "remove",
            duration_ms = start.elapsed().as_millis() as u64,
            removed = removed
        );
        Ok(removed)
    }

    fn remove_impl(&mut self, filter: &Filter, single: bool) -> Result<usize> {
        let removed = self.store.remove(filter, single)?;
        self.rebuild()?;
        Ok(removed)
    }

    /// Recompute every node's coordinates
    ///
    /// # Errors
    ///
    /// See [`TreeIndexer::rebuild`].
    pub fn rebuild(&mut self) -> Result<RebuildReport> {
        TreeIndexer::new(&self.config).rebuild(&mut self.store)
    }

    /// Check the stored coordinates against the nested-set invariants
    ///
    /// # Errors
    ///
    /// Returns `InconsistentState` naming the first violation.
    pub fn verify(&self) -> Result<()> {
        let nodes = self
            .store
            .find(&Filter::All, &FindOptions::new())?
            .into_iter()
            .map(|doc| Node::from_document(doc, &self.config))
            .collect::<Vec<_>>();
        check_invariants(&nodes, &self.config)
    }

    /// # Errors
    ///
    /// Returns `StoreUnavailable` on store failure.
    pub fn get_by_id(&self, id: &DocId) -> Result<Option<Node>> {
        Ok(self
            .store
            .find_one(&Filter::Id(id.clone()))?
            .map(|doc| Node::from_document(doc, &self.config)))
    }

    /// First node (store-native order) carrying `key`
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` on store failure.
    pub fn get_by_key(&self, key: &Value) -> Result<Option<Node>> {
        self.find_by_key(key)
    }

    fn find_by_key(&self, key: &Value) -> Result<Option<Node>> {
        Ok(self
            .store
            .find_one(&Filter::Eq(self.config.primary_column.clone(), key.clone()))?
            .map(|doc| Node::from_document(doc, &self.config)))
    }

    fn find_all_by_key(&self, key: &Value) -> Result<Vec<Node>> {
        Ok(self
            .store
            .find(
                &Filter::Eq(self.config.primary_column.clone(), key.clone()),
                &FindOptions::new(),
            )?
            .into_iter()
            .map(|doc| Node::from_document(doc, &self.config))
            .collect())
    }

    fn check_key(&self, key: &Value) -> Result<()> {
        // a key that reads as an empty parent reference could never be
        // referenced by children
        let blank = matches!(key, Value::String(s) if s.trim().is_empty());
        if blank || is_empty_ref(key) {
            return Err(TreeError::InvalidInput {
                reason: format!("{} must not be empty", self.config.primary_column),
            });
        }
        if match_key(key) == match_key(&self.config.root_value) {
            return Err(TreeError::InvalidInput {
                reason: format!(
                    "{} must differ from the root value {}",
                    self.config.primary_column,
                    key_label(&self.config.root_value)
                ),
            });
        }
        Ok(())
    }

    /// Walk parent references upward from `parent` looking for `key`
    ///
    /// The node being updated is skipped during lookups: after the write it
    /// answers to `key`, which is compared directly.
    fn check_no_cycle(&self, id: &DocId, key: &Value, parent: &Value) -> Result<()> {
        let own = match_key(key);
        let root = match_key(&self.config.root_value);
        let mut seen = HashSet::new();
        let mut cursor = parent.clone();

        loop {
            let cursor_key = match_key(&cursor);
            if cursor_key.is_none() || cursor_key == root {
                return Ok(());
            }
            if cursor_key == own {
                return Err(TreeError::CycleDetected {
                    key: key_label(key),
                    parent: key_label(parent),
                });
            }
            if !seen.insert(cursor_key) {
                // An existing loop above the new parent that does not pass
                // through this node.
                return Ok(());
            }

            let next = self
                .find_all_by_key(&cursor)?
                .into_iter()
                .find(|node| &node.id != id);
            match next {
                Some(node) => cursor = node.parent,
                None => return Ok(()),
            }
        }
    }
}

fn timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::MemoryStore;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn gateway() -> MutationGateway<MemoryStore> {
        MutationGateway::new(MemoryStore::new(), TreeConfig::default()).unwrap()
    }

    #[test]
    fn test_create_defaults_parent_and_coordinates() {
        let mut gw = gateway();
        let id = gw
            .create(fields(json!({"item": "a", "lft": 99, "level": 7})))
            .unwrap();

        let node = gw.get_by_id(&id).unwrap().unwrap();
        assert_eq!(node.parent, json!("0"));
        assert_eq!(node.coords, Coordinates::new(0, 1, 1));
    }

    #[test]
    fn test_create_normalizes_empty_parent() {
        let mut gw = gateway();
        for (key, parent) in [("a", json!("")), ("b", json!(null)), ("c", json!(0))] {
            let id = gw.create(fields(json!({"item": key, "parent": parent}))).unwrap();
            assert_eq!(gw.get_by_id(&id).unwrap().unwrap().parent, json!("0"));
        }
    }

    #[test]
    fn test_create_rejects_missing_and_duplicate_keys() {
        let mut gw = gateway();
        assert!(matches!(
            gw.create(fields(json!({"name": "x"}))),
            Err(TreeError::InvalidInput { .. })
        ));
        assert!(matches!(
            gw.create(fields(json!({"item": "0"}))),
            Err(TreeError::InvalidInput { .. })
        ));
        gw.create(fields(json!({"item": "a"}))).unwrap();
        assert_eq!(
            gw.create(fields(json!({"item": "a"}))),
            Err(TreeError::DuplicateKey { key: "a".to_string() })
        );
        assert_eq!(gw.store().len(), 1);
    }

    #[test]
    fn test_create_rejects_keys_that_read_as_no_parent() {
        let mut gw = gateway();
        for key in [json!(0), json!(false), json!([]), json!({}), json!(""), json!("  ")] {
            let result = gw.create(fields(json!({"item": key.clone()})));
            assert!(
                matches!(result, Err(TreeError::InvalidInput { .. })),
                "{} should be refused",
                key
            );
        }
        assert!(gw.store().is_empty());
    }

    #[test]
    fn test_create_rejects_self_parent() {
        let mut gw = gateway();
        let err = gw
            .create(fields(json!({"item": "a", "parent": "a"})))
            .unwrap_err();
        assert!(matches!(err, TreeError::CycleDetected { .. }));
        assert!(gw.store().is_empty());
    }

    #[test]
    fn test_update_ignores_coordinates() {
        let mut gw = gateway();
        let id = gw.create(fields(json!({"item": "a"}))).unwrap();
        gw.update(&id, fields(json!({"lft": 40, "name": "Apple"})))
            .unwrap();

        let node = gw.get_by_id(&id).unwrap().unwrap();
        assert_eq!(node.coords, Coordinates::new(0, 1, 1));
        assert_eq!(node.label(gw.config()), "Apple");
    }

    #[test]
    fn test_update_unknown_identity() {
        let mut gw = gateway();
        let err = gw
            .update(&DocId::new("missing"), fields(json!({"name": "x"})))
            .unwrap_err();
        assert!(matches!(err, TreeError::NodeNotFound { .. }));
    }

    #[test]
    fn test_update_rejects_cycles() {
        let mut gw = gateway();
        let a = gw.create(fields(json!({"item": "a"}))).unwrap();
        gw.create(fields(json!({"item": "b", "parent": "a"}))).unwrap();
        gw.create(fields(json!({"item": "c", "parent": "b"}))).unwrap();

        for parent in ["a", "c"] {
            let err = gw
                .update(&a, fields(json!({"parent": parent})))
                .unwrap_err();
            assert!(matches!(err, TreeError::CycleDetected { .. }), "{}", parent);
        }
        assert_eq!(gw.get_by_id(&a).unwrap().unwrap().parent, json!("0"));
    }

    #[test]
    fn test_update_key_change_to_taken_key() {
        let mut gw = gateway();
        let a = gw.create(fields(json!({"item": "a"}))).unwrap();
        gw.create(fields(json!({"item": "b"}))).unwrap();

        let err = gw.update(&a, fields(json!({"item": "b"}))).unwrap_err();
        assert!(matches!(err, TreeError::DuplicateKey { .. }));
        gw.update(&a, fields(json!({"item": "a"}))).unwrap();
    }

    #[test]
    fn test_timestamps_when_configured() {
        let config = TreeConfig {
            date_insert_column: Some("created".to_string()),
            date_update_column: Some("modified".to_string()),
            ..TreeConfig::default()
        };
        let mut gw = MutationGateway::new(MemoryStore::new(), config).unwrap();
        let id = gw.create(fields(json!({"item": "a"}))).unwrap();

        let node = gw.get_by_id(&id).unwrap().unwrap();
        let created = node.fields.get("created").and_then(Value::as_str).unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(created, TIMESTAMP_FORMAT).is_ok());
        assert!(node.fields.contains_key("modified"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TreeConfig {
            parent_column: "item".to_string(),
            ..TreeConfig::default()
        };
        assert!(matches!(
            MutationGateway::new(MemoryStore::new(), config),
            Err(TreeError::Config { .. })
        ));
    }
}

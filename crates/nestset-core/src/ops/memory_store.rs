use crate::errors::{Result, TreeError};
use crate::model::{DocId, Document, Fields, Filter, FindOptions};
use crate::ops::store::DocumentStore;

/// In-memory document store
///
/// Documents are kept in insertion order, which is the store-native order.
/// Not thread-safe on its own; share it through `SharedTree`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Vec<Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { docs: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// All documents in store-native order
    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    fn position(&self, id: &DocId) -> Option<usize> {
        self.docs.iter().position(|d| &d.id == id)
    }
}

impl DocumentStore for MemoryStore {
    fn insert(&mut self, fields: Fields) -> Result<DocId> {
        let id = DocId::generate();
        self.docs.push(Document::new(id.clone(), fields));
        Ok(id)
    }

    fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>> {
        let matching = self
            .docs
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        Ok(options.apply(matching))
    }

    fn update(&mut self, id: &DocId, fields: &Fields) -> Result<()> {
        let pos = self
            .position(id)
            .ok_or_else(|| TreeError::NodeNotFound { id: id.to_string() })?;
        self.docs[pos].fields = fields.clone();
        Ok(())
    }

    fn remove(&mut self, filter: &Filter, single: bool) -> Result<usize> {
        if single {
            return Ok(match self.docs.iter().position(|d| filter.matches(d)) {
                Some(pos) => {
                    self.docs.remove(pos);
                    1
                }
                None => 0,
            });
        }

        let before = self.docs.len();
        self.docs.retain(|d| !filter.matches(d));
        Ok(before - self.docs.len())
    }

    /// Applies every patch to a copy and swaps it in, so either all
    /// patches land or none do.
    fn apply_patches(&mut self, patches: &[(DocId, Fields)]) -> Result<()> {
        let mut next = self.docs.clone();
        for (id, patch) in patches {
            let doc = next
                .iter_mut()
                .find(|d| &d.id == id)
                .ok_or_else(|| TreeError::NodeNotFound { id: id.to_string() })?;
            doc.merge(patch);
        }
        self.docs = next;
        Ok(())
    }
}

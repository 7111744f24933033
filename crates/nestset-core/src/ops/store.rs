use crate::errors::{Result, TreeError};
use crate::model::{DocId, Document, Fields, Filter, FindOptions};

/// Document collection the tree lives in
///
/// Store-native order (the order `find` returns documents in when no sort
/// key is given, and the tiebreak between equal sort keys) must be stable:
/// the indexer relies on it for reproducible coordinates.
pub trait DocumentStore {
    /// Insert a new document and return its store-assigned identity
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the store rejects the write.
    fn insert(&mut self, fields: Fields) -> Result<DocId>;

    /// Documents matching `filter`, ordered and paged by `options`
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` on store failure.
    fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>>;

    /// First matching document in store-native order
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` on store failure.
    fn find_one(&self, filter: &Filter) -> Result<Option<Document>> {
        Ok(self
            .find(filter, &FindOptions::new().limit(1))?
            .into_iter()
            .next())
    }

    /// Replace the full field set of an existing document
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if no document has this identity.
    fn update(&mut self, id: &DocId, fields: &Fields) -> Result<()>;

    /// Delete the first (`single`) or every matching document
    ///
    /// Returns how many documents were removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` on store failure.
    fn remove(&mut self, filter: &Filter, single: bool) -> Result<usize>;

    /// Merge partial field sets into several documents
    ///
    /// The default applies patches one document at a time, so a failure
    /// part way leaves earlier patches applied. Stores that can should
    /// override this to apply all patches or none.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` for a patch whose document does not exist.
    fn apply_patches(&mut self, patches: &[(DocId, Fields)]) -> Result<()> {
        for (id, patch) in patches {
            let mut doc = self
                .find_one(&Filter::Id(id.clone()))?
                .ok_or_else(|| TreeError::NodeNotFound { id: id.to_string() })?;
            doc.merge(patch);
            self.update(id, &doc.fields)?;
        }
        Ok(())
    }
}

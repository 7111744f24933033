use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use crate::errors::{Result, TreeError};
use crate::model::{DocId, Fields, Filter, Node, SelectOption, TreeNode};
use crate::ops::gateway::MutationGateway;
use crate::ops::store::DocumentStore;
use crate::traversal::RebuildReport;

/// Thread-shareable handle to one gateway
///
/// Each mutation holds the lock across its write and the rebuild that
/// follows, so readers never see a half-indexed tree written through this
/// handle. Writers that reach the store another way are not serialized.
pub struct SharedTree<S: DocumentStore> {
    inner: Arc<Mutex<MutationGateway<S>>>,
}

impl<S: DocumentStore> Clone for SharedTree<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: DocumentStore> SharedTree<S> {
    pub fn new(gateway: MutationGateway<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(gateway)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MutationGateway<S>>> {
        self.inner.lock().map_err(|_| TreeError::LockPoisoned)
    }

    /// Run `f` with exclusive access to the gateway
    ///
    /// # Errors
    ///
    /// Returns `LockPoisoned` if a previous holder panicked, or whatever
    /// `f` returns.
    pub fn with_gateway<R>(&self, f: impl FnOnce(&mut MutationGateway<S>) -> Result<R>) -> Result<R> {
        let mut gateway = self.lock()?;
        f(&mut gateway)
    }

    /// # Errors
    ///
    /// See [`MutationGateway::create`].
    pub fn create(&self, fields: Fields) -> Result<DocId> {
        self.with_gateway(|gw| gw.create(fields))
    }

    /// # Errors
    ///
    /// See [`MutationGateway::update`].
    pub fn update(&self, id: &DocId, fields: Fields) -> Result<()> {
        self.with_gateway(|gw| gw.update(id, fields))
    }

    /// # Errors
    ///
    /// See [`MutationGateway::remove`].
    pub fn remove(&self, filter: &Filter, single: bool) -> Result<usize> {
        self.with_gateway(|gw| gw.remove(filter, single))
    }

    /// # Errors
    ///
    /// See [`MutationGateway::rebuild`].
    pub fn rebuild(&self) -> Result<RebuildReport> {
        self.with_gateway(|gw| gw.rebuild())
    }

    /// # Errors
    ///
    /// See [`TreeQueryEngine::get_tree`](crate::queries::TreeQueryEngine::get_tree).
    pub fn get_tree(&self, top: &Value) -> Result<Vec<TreeNode>> {
        self.with_gateway(|gw| gw.queries().get_tree(top))
    }

    /// # Errors
    ///
    /// See [`TreeQueryEngine::get_parents`](crate::queries::TreeQueryEngine::get_parents).
    pub fn get_parents(&self, node: &Node, include_current: bool) -> Result<Vec<Node>> {
        self.with_gateway(|gw| gw.queries().get_parents(node, include_current))
    }

    /// # Errors
    ///
    /// See [`TreeQueryEngine::get_form_select_options`](crate::queries::TreeQueryEngine::get_form_select_options).
    pub fn get_form_select_options(&self, current: Option<&Value>) -> Result<Vec<SelectOption>> {
        self.with_gateway(|gw| gw.queries().get_form_select_options(current))
    }

    /// # Errors
    ///
    /// See [`MutationGateway::verify`].
    pub fn verify(&self) -> Result<()> {
        self.with_gateway(|gw| gw.verify())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::ops::MemoryStore;
    use serde_json::json;
    use std::thread;

    #[test]
    fn test_concurrent_writers_keep_tree_consistent() {
        let gateway = MutationGateway::new(MemoryStore::new(), TreeConfig::default()).unwrap();
        let tree = SharedTree::new(gateway);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let tree = tree.clone();
                thread::spawn(move || {
                    for i in 0..5 {
                        let fields = json!({"item": format!("n{}-{}", t, i)});
                        tree.create(fields.as_object().cloned().unwrap()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        tree.verify().unwrap();
        assert_eq!(tree.get_tree(&json!("0")).unwrap().len(), 20);
    }

    #[test]
    fn test_parents_through_shared_handle() {
        let gateway = MutationGateway::new(MemoryStore::new(), TreeConfig::default()).unwrap();
        let tree = SharedTree::new(gateway);
        tree.create(json!({"item": "a"}).as_object().cloned().unwrap())
            .unwrap();
        let id = tree
            .create(json!({"item": "a1", "parent": "a"}).as_object().cloned().unwrap())
            .unwrap();

        let leaf = tree.with_gateway(|gw| gw.get_by_id(&id)).unwrap().unwrap();
        let keys: Vec<Value> = tree
            .get_parents(&leaf, true)
            .unwrap()
            .into_iter()
            .map(|node| node.key)
            .collect();

        assert_eq!(keys, vec![json!("a"), json!("a1")]);
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let gateway = MutationGateway::new(MemoryStore::new(), TreeConfig::default()).unwrap();
        let tree = SharedTree::new(gateway);

        let poisoner = tree.clone();
        let _ = thread::spawn(move || {
            let _ = poisoner.with_gateway(|_| -> Result<()> { panic!("writer crashed") });
        })
        .join();

        assert_eq!(tree.rebuild(), Err(TreeError::LockPoisoned));
    }
}

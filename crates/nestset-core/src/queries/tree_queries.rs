//! Read-side queries over indexed coordinates
//!
//! Every query is a single coordinate-ordered scan of the store; nested
//! structures are assembled in memory without recursion.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::Value;

use crate::config::TreeConfig;
use crate::errors::{Result, TreeError};
use crate::model::{
    is_empty_ref, key_label, match_key, Coordinates, Filter, FindOptions, Node, SelectOption,
    TreeNode,
};
use crate::ops::store::DocumentStore;
use crate::{log_op_end, log_op_error, log_op_start};

/// Queries bound to one store and tree configuration
pub struct TreeQueryEngine<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    config: &'a TreeConfig,
}

impl<'a, S: DocumentStore + ?Sized> TreeQueryEngine<'a, S> {
    pub fn new(store: &'a S, config: &'a TreeConfig) -> Self {
        Self { store, config }
    }

    /// Nested tree below `top`
    ///
    /// `top` is the root value (or any empty reference) for the whole tree,
    /// or the primary key of a node for its subtree. The returned entries
    /// are the direct children of `top`, each carrying its own children.
    ///
    /// # Errors
    ///
    /// * `ParentNotFound` - `top` is a key no node carries
    /// * `InconsistentState` - strict mode only, a scanned node's parent is
    ///   not part of the scan
    /// * `StoreUnavailable` - the scan failed
    pub fn get_tree(&self, top: &Value) -> Result<Vec<TreeNode>> {
        log_op_start!("get_tree", node_key = %key_label(top));
        let start = Instant::now();

        let tree = self.get_tree_impl(top).map_err(|e| {
            log_op_error!(
                "get_tree",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "get_tree",
            duration_ms = start.elapsed().as_millis() as u64,
            roots = tree.len()
        );
        Ok(tree)
    }

    fn get_tree_impl(&self, top: &Value) -> Result<Vec<TreeNode>> {
        let config = self.config;
        let (top_key, filter) = if self.is_root(top) {
            (
                match_key(&config.root_value),
                Filter::gte(config.level_column.clone(), 1),
            )
        } else {
            let top_node = self.find_by_key(top)?.ok_or_else(|| TreeError::ParentNotFound {
                key: key_label(top),
            })?;
            (
                match_key(top),
                Filter::and(vec![
                    Filter::gt(config.left_column.clone(), top_node.coords.left),
                    Filter::lt(config.right_column.clone(), top_node.coords.right),
                    Filter::gte(config.level_column.clone(), 1),
                ]),
            )
        };

        let nodes = self.scan(&filter)?;

        let mut entries: Vec<Option<TreeNode>> = Vec::with_capacity(nodes.len());
        let mut parents: Vec<Option<usize>> = Vec::with_capacity(nodes.len());
        let mut index: HashMap<String, usize> = HashMap::new();

        for node in &nodes {
            let parent_key = match_key(&node.parent);
            let parent = if parent_key.is_some() && parent_key == top_key {
                None
            } else {
                match parent_key.and_then(|k| index.get(&k).copied()) {
                    Some(slot) => Some(slot),
                    None => {
                        self.missing_parent(node)?;
                        continue;
                    }
                }
            };

            let slot = entries.len();
            if let Some(key) = match_key(&node.key) {
                index.entry(key).or_insert(slot);
            }
            entries.push(Some(TreeNode::from_node(node, config)));
            parents.push(parent);
        }

        // Children always sit right of their parent in left order, so a
        // reverse pass finishes every child list before its parent moves.
        let mut roots = Vec::new();
        for slot in (0..entries.len()).rev() {
            let Some(mut entry) = entries[slot].take() else {
                continue;
            };
            entry.children.reverse();
            match parents[slot].and_then(|p| entries[p].as_mut()) {
                Some(parent) => parent.children.push(entry),
                None => roots.push(entry),
            }
        }
        roots.reverse();

        Ok(roots)
    }

    /// Ancestors of `node`, outermost first
    ///
    /// With `include_current` the node itself is the last entry. A node that
    /// is not attached to the tree has no ancestors.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the scan fails.
    pub fn get_parents(&self, node: &Node, include_current: bool) -> Result<Vec<Node>> {
        log_op_start!("get_parents", doc_id = %node.id);
        let start = Instant::now();

        let parents = self.get_parents_impl(node, include_current).map_err(|e| {
            log_op_error!(
                "get_parents",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "get_parents",
            duration_ms = start.elapsed().as_millis() as u64,
            found = parents.len()
        );
        Ok(parents)
    }

    fn get_parents_impl(&self, node: &Node, include_current: bool) -> Result<Vec<Node>> {
        if !node.is_attached() {
            return Ok(if include_current {
                vec![node.clone()]
            } else {
                Vec::new()
            });
        }

        let config = self.config;
        let Coordinates { left, right, .. } = node.coords;
        let range = if include_current {
            vec![
                Filter::lte(config.left_column.clone(), left),
                Filter::gte(config.right_column.clone(), right),
            ]
        } else {
            vec![
                Filter::lt(config.left_column.clone(), left),
                Filter::gt(config.right_column.clone(), right),
            ]
        };
        let filter = Filter::and(
            range
                .into_iter()
                .chain([Filter::gte(config.level_column.clone(), 1)])
                .collect(),
        );

        self.scan(&filter)
    }

    /// Indented parent picker over every node in the tree
    ///
    /// When `current` is the key of an existing node, that node and its
    /// whole subtree are disabled so a node cannot be moved under itself.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the scan fails.
    pub fn get_form_select_options(&self, current: Option<&Value>) -> Result<Vec<SelectOption>> {
        log_op_start!("get_form_select_options");
        let start = Instant::now();

        let options = self.get_form_select_options_impl(current).map_err(|e| {
            log_op_error!(
                "get_form_select_options",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "get_form_select_options",
            duration_ms = start.elapsed().as_millis() as u64,
            found = options.len()
        );
        Ok(options)
    }

    fn get_form_select_options_impl(&self, current: Option<&Value>) -> Result<Vec<SelectOption>> {
        let config = self.config;
        let excluded = match current {
            Some(key) if !key.is_null() => self
                .find_by_key(key)?
                .filter(Node::is_attached)
                .map(|n| n.coords),
            _ => None,
        };

        let nodes = self.scan(&Filter::gte(config.level_column.clone(), 1))?;
        Ok(nodes
            .iter()
            .map(|node| {
                let depth = usize::try_from(node.coords.level - 1).unwrap_or(0);
                SelectOption {
                    label: format!("{}{}", config.indent.repeat(depth), node.label(config)),
                    value: node.key.clone(),
                    disabled: excluded.is_some_and(|range| range.contains(&node.coords)),
                }
            })
            .collect())
    }

    fn is_root(&self, value: &Value) -> bool {
        is_empty_ref(value) || match_key(value) == match_key(&self.config.root_value)
    }

    fn find_by_key(&self, key: &Value) -> Result<Option<Node>> {
        Ok(self
            .store
            .find_one(&Filter::Eq(self.config.primary_column.clone(), key.clone()))?
            .map(|doc| Node::from_document(doc, self.config)))
    }

    /// Matching nodes ordered by `left`
    fn scan(&self, filter: &Filter) -> Result<Vec<Node>> {
        let options = FindOptions::ordered_by(self.config.left_column.clone());
        Ok(self
            .store
            .find(filter, &options)?
            .into_iter()
            .map(|doc| Node::from_document(doc, self.config))
            .collect())
    }

    fn missing_parent(&self, node: &Node) -> Result<()> {
        if self.config.strict {
            return Err(TreeError::inconsistent(format!(
                "node {} references parent {:?} outside the indexed range",
                node.id,
                key_label(&node.parent)
            )));
        }
        tracing::warn!(
            doc_id = %node.id,
            parent = %key_label(&node.parent),
            "skipping node whose parent is not in the tree"
        );
        Ok(())
    }
}

//! Nested-set rebuild (modified preorder traversal)
//!
//! The walk starts at the virtual root (the configured root value), hands
//! out `left` on the way down and `right` on the way back up. It runs on an
//! explicit stack so tree depth is bounded by memory, not by the call stack.
//! The virtual root occupies no coordinate: its first child starts at
//! `root_left`.
//!
//! A rebuild never writes while walking. It stages a full generation of
//! coordinates and commits the changed ones with a single
//! [`DocumentStore::apply_patches`] call. On stores whose `apply_patches`
//! is atomic the tree moves from one consistent generation to the next; on
//! stores using the default per-document patching a failed commit leaves a
//! mix of old and new coordinates until the next successful rebuild.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use crate::config::{RebuildStrategy, TreeConfig};
use crate::errors::Result;
use crate::model::{match_key, Coordinates, DocId, Document, Fields, Filter, FindOptions, Node};
use crate::ops::store::DocumentStore;
use crate::rules::check_invariants;
use crate::{log_op_end, log_op_error, log_op_start};

/// Outcome of one rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RebuildReport {
    /// Nodes reached from the root
    pub visited: usize,
    /// Documents whose coordinates changed
    pub written: usize,
    /// Nodes not reachable from the root
    pub detached: usize,
    pub duration_ms: u64,
}

/// Coordinates computed by one walk, not yet committed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    /// Every reachable node with its new coordinates, in preorder
    pub assigned: Vec<(DocId, Coordinates)>,
    /// Field patches for documents whose stored coordinates differ
    pub patches: Vec<(DocId, Fields)>,
    pub detached: usize,
}

impl Generation {
    pub fn coordinates_of(&self, id: &DocId) -> Option<Coordinates> {
        self.assigned
            .iter()
            .find(|(assigned, _)| assigned == id)
            .map(|(_, coords)| *coords)
    }
}

/// Recomputes `left`/`right`/`level` for every node of one tree
#[derive(Debug, Clone, Copy)]
pub struct TreeIndexer<'a> {
    config: &'a TreeConfig,
}

struct Frame {
    /// Slot in `assigned`; `None` for the virtual root
    slot: Option<usize>,
    previous: Coordinates,
    level: i64,
    cursor: i64,
    children: std::vec::IntoIter<Document>,
}

impl<'a> TreeIndexer<'a> {
    pub fn new(config: &'a TreeConfig) -> Self {
        Self { config }
    }

    /// Recompute and persist the coordinates of every node
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if a fetch or the commit fails, and
    /// `InconsistentState` in strict mode when the committed tree does not
    /// pass the invariant check.
    pub fn rebuild<S: DocumentStore + ?Sized>(&self, store: &mut S) -> Result<RebuildReport> {
        log_op_start!("rebuild", strategy = ?self.config.strategy);
        let start = Instant::now();

        let mut report = self.rebuild_impl(store).map_err(|e| {
            log_op_error!(
                "rebuild",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;
        report.duration_ms = start.elapsed().as_millis() as u64;

        log_op_end!(
            "rebuild",
            duration_ms = report.duration_ms,
            visited = report.visited,
            written = report.written,
            detached = report.detached
        );

        Ok(report)
    }

    fn rebuild_impl<S: DocumentStore + ?Sized>(&self, store: &mut S) -> Result<RebuildReport> {
        let generation = self.plan(&*store)?;

        if !generation.patches.is_empty() {
            store.apply_patches(&generation.patches)?;
        }

        if self.config.strict {
            let nodes = store
                .find(&Filter::All, &FindOptions::new())?
                .into_iter()
                .map(|doc| Node::from_document(doc, self.config))
                .collect::<Vec<_>>();
            check_invariants(&nodes, self.config)?;
        }

        Ok(RebuildReport {
            visited: generation.assigned.len(),
            written: generation.patches.len(),
            detached: generation.detached,
            duration_ms: 0,
        })
    }

    /// Compute the next generation without writing anything
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if a fetch fails.
    pub fn plan<S: DocumentStore + ?Sized>(&self, store: &S) -> Result<Generation> {
        let order = self.sibling_order();

        let (generation, visited, all) = match self.config.strategy {
            RebuildStrategy::PerNode => {
                let parent_column = self.config.parent_column.clone();
                let mut fetch = |key: &Value| -> Result<Vec<Document>> {
                    store.find(&Filter::Eq(parent_column.clone(), key.clone()), &order)
                };
                let (generation, visited) = self.walk(&mut fetch)?;
                let all = store.find(&Filter::All, &FindOptions::new())?;
                (generation, visited, all)
            }
            RebuildStrategy::Batched => {
                let all = store.find(&Filter::All, &order)?;
                let mut by_parent: HashMap<String, Vec<Document>> = HashMap::new();
                for doc in &all {
                    let parent = doc.get(&self.config.parent_column).and_then(match_key);
                    if let Some(parent) = parent {
                        by_parent.entry(parent).or_default().push(doc.clone());
                    }
                }
                let mut fetch = |key: &Value| -> Result<Vec<Document>> {
                    Ok(match_key(key)
                        .and_then(|k| by_parent.remove(&k))
                        .unwrap_or_default())
                };
                let (generation, visited) = self.walk(&mut fetch)?;
                (generation, visited, all)
            }
        };

        Ok(self.detach_unvisited(generation, &visited, all))
    }

    fn sibling_order(&self) -> FindOptions {
        match &self.config.order_column {
            Some(column) => FindOptions::ordered_by(column.clone()),
            None => FindOptions::new(),
        }
    }

    /// Depth-first assignment from the virtual root
    fn walk<F>(&self, fetch_children: &mut F) -> Result<(Generation, HashSet<DocId>)>
    where
        F: FnMut(&Value) -> Result<Vec<Document>>,
    {
        let mut generation = Generation::default();
        let mut visited: HashSet<DocId> = HashSet::new();

        let roots = fetch_children(&self.config.root_value)?;
        let mut stack = vec![Frame {
            slot: None,
            previous: Coordinates::PLACEHOLDER,
            level: 0,
            cursor: self.config.root_left,
            children: roots.into_iter(),
        }];

        while let Some(top) = stack.last_mut() {
            if let Some(child) = top.children.next() {
                if !visited.insert(child.id.clone()) {
                    tracing::warn!(
                        doc_id = %child.id,
                        "node reached twice during rebuild, keeping first position"
                    );
                    continue;
                }

                let left = top.cursor;
                let level = top.level + 1;
                let node = Node::from_document(child, self.config);
                let children = if node.key.is_null() {
                    Vec::new()
                } else {
                    fetch_children(&node.key)?
                };

                generation
                    .assigned
                    .push((node.id, Coordinates::new(left, left, level)));
                stack.push(Frame {
                    slot: Some(generation.assigned.len() - 1),
                    previous: node.coords,
                    level,
                    cursor: left + 1,
                    children: children.into_iter(),
                });
            } else {
                let Some(frame) = stack.pop() else { break };
                let right = frame.cursor;

                if let Some(slot) = frame.slot {
                    let (id, coords) = &mut generation.assigned[slot];
                    coords.right = right;
                    if *coords != frame.previous {
                        generation
                            .patches
                            .push((id.clone(), coords.to_fields(self.config)));
                    }
                }

                if let Some(parent) = stack.last_mut() {
                    parent.cursor = right + 1;
                }
            }
        }

        Ok((generation, visited))
    }

    /// Reset every unreachable node to the placeholder coordinates
    fn detach_unvisited(
        &self,
        mut generation: Generation,
        visited: &HashSet<DocId>,
        all: Vec<Document>,
    ) -> Generation {
        for doc in all {
            if visited.contains(&doc.id) {
                continue;
            }
            generation.detached += 1;
            let node = Node::from_document(doc, self.config);
            if node.coords != Coordinates::PLACEHOLDER {
                tracing::debug!(doc_id = %node.id, "detaching node unreachable from root");
                generation
                    .patches
                    .push((node.id, Coordinates::PLACEHOLDER.to_fields(self.config)));
            }
        }
        generation
    }
}

//! nestset core - nested-set indexing over a flat document collection
//!
//! This crate keeps `left`/`right`/`level` coordinates consistent for a tree
//! stored as documents that only know their parent's key, and answers
//! subtree and ancestor queries from those coordinates:
//! - Document model, filters and the [`DocumentStore`] trait
//! - In-memory store with atomic coordinate commits
//! - Mutation gateway that reindexes after every write
//! - Full rebuild (per-node or batched walk, explicit stack)
//! - Tree, ancestor and select-option queries
//! - Invariant checker and HTML rendering

pub mod config;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod queries;
pub mod render;
pub mod rules;
pub mod traversal;

#[doc(hidden)]
pub use tracing as __tracing;

// Re-export commonly used types
pub use config::{RebuildStrategy, TreeConfig};
pub use errors::{ExError, ExErrorKind, Result, TreeError};
pub use model::{DocId, Document, Fields, Filter, FindOptions, Node, SelectOption, TreeNode};
pub use ops::{DocumentStore, MemoryStore, MutationGateway, SharedTree};
pub use queries::TreeQueryEngine;
pub use render::display_tree;
pub use rules::check_invariants;
pub use traversal::{RebuildReport, TreeIndexer};

pub mod tree_queries;

pub use tree_queries::TreeQueryEngine;

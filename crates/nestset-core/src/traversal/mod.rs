pub mod indexer;

pub use indexer::{Generation, RebuildReport, TreeIndexer};

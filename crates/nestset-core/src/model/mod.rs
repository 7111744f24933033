pub mod document;
pub mod filter;
pub mod node;

pub use document::{DocId, Document, Fields};
pub use filter::{compare_values, Direction, Filter, FindOptions, SortKey};
pub use node::{is_empty_ref, key_label, match_key, Coordinates, Node, SelectOption, TreeNode};

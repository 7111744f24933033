pub mod tree_render;

pub use tree_render::{display_tree, escape_html};

use crate::config::TreeConfig;
use crate::errors::{Result, TreeError};
use crate::model::Node;

use super::invariants;

/// Verify the nested-set invariants over a full node listing
///
/// Only nodes attached to the tree are checked; detached nodes carry the
/// placeholder coordinates and take no part in the numbering.
///
/// 1. every range is non-empty (`left < right`)
/// 2. every parent reference of an attached node resolves inside the tree
/// 3. children sit strictly inside their parent, one level below it, and
///    top-level nodes are at level 1
/// 4. siblings do not overlap
/// 5. leaves have `right = left + 1`
/// 6. `left`/`right` form the contiguous sequence starting at `root_left`
///
/// # Errors
///
/// Returns `InconsistentState` describing the first violation found.
pub fn check_invariants(nodes: &[Node], config: &TreeConfig) -> Result<()> {
    if let Some(id) = invariants::find_inverted_ranges(nodes).first() {
        return Err(TreeError::inconsistent(format!(
            "node {} has left >= right",
            id
        )));
    }

    if let Some((id, parent)) = invariants::find_unresolved_parents(nodes, config).first() {
        return Err(TreeError::inconsistent(format!(
            "node {} is indexed but its parent {:?} is not in the tree",
            id, parent
        )));
    }

    if let Some((id, reason)) = invariants::find_misplaced_children(nodes, config).first() {
        return Err(TreeError::inconsistent(format!("node {}: {}", id, reason)));
    }

    if let Some((first, second)) = invariants::find_overlapping_siblings(nodes, config).first() {
        return Err(TreeError::inconsistent(format!(
            "siblings {} and {} overlap",
            first, second
        )));
    }

    if let Some(id) = invariants::find_loose_leaves(nodes, config).first() {
        return Err(TreeError::inconsistent(format!(
            "leaf {} does not have right = left + 1",
            id
        )));
    }

    if let Some((expected, found)) = invariants::find_coordinate_gap(nodes, config.root_left) {
        return Err(TreeError::inconsistent(format!(
            "coordinate sequence broken: expected {}, found {}",
            expected, found
        )));
    }

    Ok(())
}

//! Individual nested-set invariant finders
//!
//! Every finder looks only at nodes attached to the tree (`level > 0`) and
//! returns all violations it sees; [`super::validation::check_invariants`]
//! turns the first one into an error.

use std::collections::{HashMap, HashSet};

use crate::config::TreeConfig;
use crate::model::{match_key, DocId, Node};

/// Attached nodes ordered by `left`
pub fn attached_in_order(nodes: &[Node]) -> Vec<&Node> {
    let mut attached: Vec<&Node> = nodes.iter().filter(|n| n.is_attached()).collect();
    attached.sort_by_key(|n| n.coords.left);
    attached
}

/// Resolved parent of every attached node
///
/// `None` means the node hangs off the virtual root. A node whose parent
/// reference matches no attached node is reported separately by
/// [`find_unresolved_parents`]. With duplicate keys the leftmost holder
/// wins, which is the node the rebuild walk reached first.
fn parent_links<'n>(
    attached: &[&'n Node],
    config: &TreeConfig,
) -> Vec<(&'n Node, Option<Option<&'n Node>>)> {
    let mut by_key: HashMap<String, &Node> = HashMap::new();
    for node in attached {
        if let Some(key) = match_key(&node.key) {
            by_key.entry(key).or_insert(node);
        }
    }
    let root = match_key(&config.root_value);

    attached
        .iter()
        .map(|node| {
            let parent_key = match_key(&node.parent);
            let link = if parent_key.is_some() && parent_key == root {
                Some(None)
            } else {
                parent_key
                    .and_then(|k| by_key.get(&k).copied())
                    .map(Some)
            };
            (*node, link)
        })
        .collect()
}

/// Nodes whose range is empty or inverted (`left >= right`)
pub fn find_inverted_ranges(nodes: &[Node]) -> Vec<DocId> {
    nodes
        .iter()
        .filter(|n| n.is_attached() && n.coords.left >= n.coords.right)
        .map(|n| n.id.clone())
        .collect()
}

/// Attached nodes whose parent reference resolves to nothing in the tree
pub fn find_unresolved_parents(nodes: &[Node], config: &TreeConfig) -> Vec<(DocId, String)> {
    let attached = attached_in_order(nodes);
    parent_links(&attached, config)
        .into_iter()
        .filter(|(_, link)| link.is_none())
        .map(|(node, _)| (node.id.clone(), crate::model::key_label(&node.parent)))
        .collect()
}

/// Children not strictly inside their parent, or not one level below it
///
/// Returns `(child, reason)` pairs.
pub fn find_misplaced_children(nodes: &[Node], config: &TreeConfig) -> Vec<(DocId, String)> {
    let attached = attached_in_order(nodes);
    let mut misplaced = Vec::new();

    for (node, link) in parent_links(&attached, config) {
        match link {
            Some(None) if node.coords.level != 1 => misplaced.push((
                node.id.clone(),
                format!("top-level node has level {}", node.coords.level),
            )),
            Some(Some(parent)) => {
                if !parent.coords.strictly_contains(&node.coords) {
                    misplaced.push((
                        node.id.clone(),
                        format!(
                            "range ({}, {}) is not inside parent range ({}, {})",
                            node.coords.left,
                            node.coords.right,
                            parent.coords.left,
                            parent.coords.right
                        ),
                    ));
                } else if node.coords.level != parent.coords.level + 1 {
                    misplaced.push((
                        node.id.clone(),
                        format!(
                            "level {} under parent at level {}",
                            node.coords.level, parent.coords.level
                        ),
                    ));
                }
            }
            _ => {}
        }
    }

    misplaced
}

/// Adjacent siblings (in `left` order) whose ranges overlap
pub fn find_overlapping_siblings(nodes: &[Node], config: &TreeConfig) -> Vec<(DocId, DocId)> {
    let attached = attached_in_order(nodes);
    let mut last_child: HashMap<Option<&DocId>, &Node> = HashMap::new();
    let mut overlapping = Vec::new();

    for (node, link) in parent_links(&attached, config) {
        let Some(parent) = link else { continue };
        let group = parent.map(|p| &p.id);
        if let Some(previous) = last_child.insert(group, node) {
            if previous.coords.right >= node.coords.left {
                overlapping.push((previous.id.clone(), node.id.clone()));
            }
        }
    }

    overlapping
}

/// Nodes without attached children whose `right` is not `left + 1`
pub fn find_loose_leaves(nodes: &[Node], config: &TreeConfig) -> Vec<DocId> {
    let attached = attached_in_order(nodes);
    let links = parent_links(&attached, config);

    let parents: HashSet<&DocId> = links
        .iter()
        .filter_map(|(_, link)| match link {
            Some(Some(parent)) => Some(&parent.id),
            _ => None,
        })
        .collect();

    attached
        .iter()
        .filter(|n| !parents.contains(&n.id) && n.coords.right != n.coords.left + 1)
        .map(|n| n.id.clone())
        .collect()
}

/// First break in the coordinate sequence, if any
///
/// The `left` and `right` values of `N` attached nodes must be exactly the
/// integers `root_left .. root_left + 2N`. Returns the expected value and
/// what was found in its place.
pub fn find_coordinate_gap(nodes: &[Node], root_left: i64) -> Option<(i64, i64)> {
    let mut values: Vec<i64> = nodes
        .iter()
        .filter(|n| n.is_attached())
        .flat_map(|n| [n.coords.left, n.coords.right])
        .collect();
    values.sort_unstable();

    let mut expected = root_left;
    for value in values {
        if value != expected {
            return Some((expected, value));
        }
        expected += 1;
    }
    None
}

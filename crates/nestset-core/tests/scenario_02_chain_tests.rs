/// Scenario 2: Single chain
///
/// A -> B -> C nests each range inside the previous one.
mod common;

use common::{coords_of, create_node, fields, new_gateway};
use nestset_core::model::Coordinates;
use nestset_core::{DocumentStore, MemoryStore, MutationGateway, TreeConfig};
use serde_json::json;

#[test]
fn test_scenario_02_chain_coordinates() {
    // GIVEN a chain a -> b -> c
    let mut gw = new_gateway();
    create_node(&mut gw, "a", "0");
    create_node(&mut gw, "b", "a");
    create_node(&mut gw, "c", "b");

    // THEN each node encloses the next
    assert_eq!(coords_of(&gw, "a"), Coordinates::new(0, 5, 1));
    assert_eq!(coords_of(&gw, "b"), Coordinates::new(1, 4, 2));
    assert_eq!(coords_of(&gw, "c"), Coordinates::new(2, 3, 3));
    gw.verify().unwrap();
}

#[test]
fn test_scenario_02_chain_created_child_first() {
    // GIVEN children inserted before their parents exist
    let mut gw = new_gateway();
    create_node(&mut gw, "c", "b");
    create_node(&mut gw, "b", "a");

    // THEN they wait detached until the chain is complete
    assert_eq!(coords_of(&gw, "b"), Coordinates::PLACEHOLDER);

    create_node(&mut gw, "a", "0");
    assert_eq!(coords_of(&gw, "a"), Coordinates::new(0, 5, 1));
    assert_eq!(coords_of(&gw, "c"), Coordinates::new(2, 3, 3));
}

#[test]
fn test_scenario_02_chain_nested_tree() {
    let mut gw = new_gateway();
    create_node(&mut gw, "a", "0");
    create_node(&mut gw, "b", "a");
    create_node(&mut gw, "c", "b");

    let tree = gw.queries().get_tree(&json!("0")).unwrap();

    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].size(), 3);
    assert_eq!(tree[0].children[0].children[0].key, json!("c"));
    assert_eq!(tree[0].children[0].children[0].level, 3);
}

#[test]
fn test_scenario_02_deep_chain_does_not_recurse() {
    // GIVEN a chain deeper than a recursive walk would comfortably handle,
    // written straight into the store
    let depth = 2000;
    let mut store = MemoryStore::new();
    for i in 0..depth {
        let parent = if i == 0 { "0".to_string() } else { format!("n{}", i - 1) };
        store
            .insert(fields(json!({"item": format!("n{}", i), "parent": parent})))
            .unwrap();
    }
    let mut gw = MutationGateway::new(store, TreeConfig::default()).unwrap();

    // WHEN indexing it in one rebuild
    let report = gw.rebuild().unwrap();

    // THEN the deepest node sits at the bottom of every range
    assert_eq!(report.visited, depth);
    let deepest = coords_of(&gw, &format!("n{}", depth - 1));
    assert_eq!(deepest.level, depth as i64);
    assert_eq!(deepest.right, deepest.left + 1);
    gw.verify().unwrap();
}

#[test]
fn test_scenario_02_deep_chain_tree_builds_and_drops() {
    // GIVEN a chain far deeper than the test thread's stack allows for
    // one frame per level
    let depth = 20_000;
    let mut store = MemoryStore::new();
    for i in 0..depth {
        let parent = if i == 0 { "0".to_string() } else { format!("n{}", i - 1) };
        store
            .insert(fields(json!({"item": format!("n{}", i), "parent": parent})))
            .unwrap();
    }
    let mut gw = MutationGateway::new(store, TreeConfig::default()).unwrap();
    gw.rebuild().unwrap();

    // WHEN the nested tree is built and then released
    let tree = gw.queries().get_tree(&json!("0")).unwrap();

    // THEN it holds the whole chain and dropping it returns normally
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].size(), depth);
    drop(tree);
}

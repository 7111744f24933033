/// Scenario 3: Reparenting
///
/// Moving a node moves its whole subtree and its ancestor list.
mod common;

use common::{coords_of, create_node, fields, new_gateway};
use nestset_core::errors::TreeError;
use serde_json::json;

#[test]
fn test_scenario_03_move_child_between_parents() {
    // GIVEN a1 under a, and a separate b
    let mut gw = new_gateway();
    create_node(&mut gw, "a", "0");
    create_node(&mut gw, "b", "0");
    let a1 = create_node(&mut gw, "a1", "a");

    // WHEN a1 is moved under b
    gw.update(&a1, fields(json!({"parent": "b"}))).unwrap();

    // THEN a1 sits strictly inside b and outside a
    let (a, b, moved) = (coords_of(&gw, "a"), coords_of(&gw, "b"), coords_of(&gw, "a1"));
    assert!(b.strictly_contains(&moved));
    assert!(!a.contains(&moved));
    assert_eq!(moved.level, 2);

    // AND its ancestors are b only
    let node = gw.get_by_id(&a1).unwrap().unwrap();
    let parents = gw.queries().get_parents(&node, false).unwrap();
    let keys: Vec<_> = parents.iter().map(|p| p.key.clone()).collect();
    assert_eq!(keys, vec![json!("b")]);
    gw.verify().unwrap();
}

#[test]
fn test_scenario_03_subtree_moves_with_its_root() {
    let mut gw = new_gateway();
    create_node(&mut gw, "a", "0");
    let b = create_node(&mut gw, "b", "0");
    create_node(&mut gw, "b1", "b");
    create_node(&mut gw, "b2", "b1");

    gw.update(&b, fields(json!({"parent": "a"}))).unwrap();

    let a = coords_of(&gw, "a");
    assert_eq!(a.right - a.left, 7);
    assert_eq!(coords_of(&gw, "b2").level, 4);
    gw.verify().unwrap();
}

#[test]
fn test_scenario_03_move_to_top_level_with_empty_parent() {
    let mut gw = new_gateway();
    create_node(&mut gw, "a", "0");
    let a1 = create_node(&mut gw, "a1", "a");

    gw.update(&a1, fields(json!({"parent": ""}))).unwrap();

    let node = gw.get_by_id(&a1).unwrap().unwrap();
    assert_eq!(node.parent, json!("0"));
    assert_eq!(node.coords.level, 1);
}

#[test]
fn test_scenario_03_move_under_own_descendant_is_refused() {
    // GIVEN a -> b -> c
    let mut gw = new_gateway();
    let a = create_node(&mut gw, "a", "0");
    create_node(&mut gw, "b", "a");
    create_node(&mut gw, "c", "b");
    let before = coords_of(&gw, "a");

    // WHEN a is moved under c
    let err = gw.update(&a, fields(json!({"parent": "c"}))).unwrap_err();

    // THEN the move is refused and nothing changes
    assert_eq!(
        err,
        TreeError::CycleDetected {
            key: "a".to_string(),
            parent: "c".to_string()
        }
    );
    assert_eq!(coords_of(&gw, "a"), before);
}

#[test]
fn test_scenario_03_key_change_detaches_old_children() {
    let mut gw = new_gateway();
    let a = create_node(&mut gw, "a", "0");
    create_node(&mut gw, "a1", "a");

    gw.update(&a, fields(json!({"item": "z"}))).unwrap();

    // a1 still points at the old key
    assert!(!coords_of(&gw, "a1").is_attached());
    assert_eq!(coords_of(&gw, "z"), nestset_core::model::Coordinates::new(0, 1, 1));
}

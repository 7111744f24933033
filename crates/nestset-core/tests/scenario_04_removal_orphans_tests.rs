/// Scenario 4: Removal and orphans
///
/// Removing a node keeps its descendants; they drop out of the tree.
mod common;

use common::{coords_of, create_node, new_gateway};
use nestset_core::model::Coordinates;
use nestset_core::Filter;
use serde_json::json;

#[test]
fn test_scenario_04_remove_root_of_chain_orphans_descendants() {
    // GIVEN a -> b -> c
    let mut gw = new_gateway();
    create_node(&mut gw, "a", "0");
    create_node(&mut gw, "b", "a");
    create_node(&mut gw, "c", "b");

    // WHEN a is removed
    let removed = gw.remove(&Filter::eq("item", "a"), true).unwrap();

    // THEN b and c survive, still pointing at their old parents
    assert_eq!(removed, 1);
    let b = gw.get_by_key(&json!("b")).unwrap().unwrap();
    let c = gw.get_by_key(&json!("c")).unwrap().unwrap();
    assert_eq!(b.parent, json!("a"));
    assert_eq!(c.parent, json!("b"));

    // AND both are detached from the tree
    assert_eq!(b.coords, Coordinates::PLACEHOLDER);
    assert_eq!(c.coords, Coordinates::PLACEHOLDER);
    assert!(gw.queries().get_tree(&json!("0")).unwrap().is_empty());
    assert!(gw.queries().get_parents(&c, false).unwrap().is_empty());
    gw.verify().unwrap();
}

#[test]
fn test_scenario_04_survivors_are_renumbered() {
    let mut gw = new_gateway();
    for key in ["a", "b", "c"] {
        create_node(&mut gw, key, "0");
    }

    gw.remove(&Filter::eq("item", "b"), true).unwrap();

    assert_eq!(coords_of(&gw, "a"), Coordinates::new(0, 1, 1));
    assert_eq!(coords_of(&gw, "c"), Coordinates::new(2, 3, 1));
}

#[test]
fn test_scenario_04_remove_many_and_nothing() {
    let mut gw = new_gateway();
    create_node(&mut gw, "a", "0");
    create_node(&mut gw, "a1", "a");
    create_node(&mut gw, "a2", "a");

    assert_eq!(gw.remove(&Filter::eq("parent", "a"), false).unwrap(), 2);
    assert_eq!(gw.remove(&Filter::eq("item", "missing"), true).unwrap(), 0);
    assert_eq!(coords_of(&gw, "a"), Coordinates::new(0, 1, 1));
}

#[test]
fn test_scenario_04_orphans_excluded_from_select_options() {
    let mut gw = new_gateway();
    create_node(&mut gw, "a", "0");
    create_node(&mut gw, "b", "a");
    create_node(&mut gw, "k", "0");

    gw.remove(&Filter::eq("item", "a"), true).unwrap();

    let options = gw.queries().get_form_select_options(None).unwrap();
    let values: Vec<_> = options.iter().map(|o| o.value.clone()).collect();
    assert_eq!(values, vec![json!("k")]);
}

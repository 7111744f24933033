use nestset_core::model::Coordinates;
use nestset_core::{DocId, Fields, MemoryStore, MutationGateway, TreeConfig};
use serde_json::{json, Value};

/// Gateway over an empty in-memory store with the default configuration
#[allow(dead_code)]
pub fn new_gateway() -> MutationGateway<MemoryStore> {
    with_config(TreeConfig::default())
}

#[allow(dead_code)]
pub fn with_config(config: TreeConfig) -> MutationGateway<MemoryStore> {
    MutationGateway::new(MemoryStore::new(), config).unwrap()
}

/// Turn a JSON object literal into a field set
#[allow(dead_code)]
pub fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}

/// Create a node labelled with its upper-cased key
#[allow(dead_code)]
pub fn create_node(
    gw: &mut MutationGateway<MemoryStore>,
    key: &str,
    parent: &str,
) -> DocId {
    gw.create(fields(
        json!({"item": key, "parent": parent, "name": key.to_uppercase()}),
    ))
    .unwrap()
}

/// Stored coordinates of the node carrying `key`
#[allow(dead_code)]
pub fn coords_of(gw: &MutationGateway<MemoryStore>, key: &str) -> Coordinates {
    gw.get_by_key(&json!(key)).unwrap().unwrap().coords
}

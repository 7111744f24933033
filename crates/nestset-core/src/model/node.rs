use serde::Serialize;
use serde_json::{Map, Value};

use super::document::{DocId, Document, Fields};
use crate::config::TreeConfig;

/// Nested-set coordinates of one node
///
/// `(0, 0, 0)` is the placeholder carried by a node that has not been
/// indexed yet or is not reachable from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Coordinates {
    pub left: i64,
    pub right: i64,
    pub level: i64,
}

impl Coordinates {
    pub const PLACEHOLDER: Coordinates = Coordinates {
        left: 0,
        right: 0,
        level: 0,
    };

    pub fn new(left: i64, right: i64, level: i64) -> Self {
        Self { left, right, level }
    }

    /// True when the node is part of the indexed tree
    pub fn is_attached(&self) -> bool {
        self.level > 0
    }

    /// Inclusive range containment
    pub fn contains(&self, other: &Coordinates) -> bool {
        self.left <= other.left && self.right >= other.right
    }

    /// Strict range containment (a proper ancestor)
    pub fn strictly_contains(&self, other: &Coordinates) -> bool {
        self.left < other.left && self.right > other.right
    }

    /// Coordinates as a field patch under the configured column names
    pub fn to_fields(&self, config: &TreeConfig) -> Fields {
        let mut fields = Map::new();
        fields.insert(config.left_column.clone(), Value::from(self.left));
        fields.insert(config.right_column.clone(), Value::from(self.right));
        fields.insert(config.level_column.clone(), Value::from(self.level));
        fields
    }
}

/// A document viewed through the tree configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: DocId,
    /// Primary key (`Null` when the document has none)
    pub key: Value,
    /// Parent reference (`Null` when the document has none)
    pub parent: Value,
    pub coords: Coordinates,
    pub fields: Fields,
}

impl Node {
    /// Interpret a document with the configured column names
    ///
    /// Missing or non-integer coordinate fields read as 0.
    pub fn from_document(doc: Document, config: &TreeConfig) -> Self {
        let int = |column: &str| doc.get(column).and_then(Value::as_i64).unwrap_or(0);
        let coords = Coordinates::new(
            int(&config.left_column),
            int(&config.right_column),
            int(&config.level_column),
        );
        let key = doc
            .get(&config.primary_column)
            .cloned()
            .unwrap_or(Value::Null);
        let parent = doc
            .get(&config.parent_column)
            .cloned()
            .unwrap_or(Value::Null);

        Self {
            id: doc.id,
            key,
            parent,
            coords,
            fields: doc.fields,
        }
    }

    /// Display label from the configured label column
    pub fn label(&self, config: &TreeConfig) -> String {
        self.fields
            .get(&config.label_column)
            .map(key_label)
            .unwrap_or_default()
    }

    pub fn is_attached(&self) -> bool {
        self.coords.is_attached()
    }
}

/// One entry of a reconstructed tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub id: DocId,
    pub key: Value,
    pub label: String,
    pub left: i64,
    pub right: i64,
    pub level: i64,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn from_node(node: &Node, config: &TreeConfig) -> Self {
        Self {
            id: node.id.clone(),
            key: node.key.clone(),
            label: node.label(config),
            left: node.coords.left,
            right: node.coords.right,
            level: node.coords.level,
            children: Vec::new(),
        }
    }

    /// Number of entries in this subtree, including this one
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(entry) = pending.pop() {
            count += 1;
            pending.extend(entry.children.iter());
        }
        count
    }
}

/// Drops the subtree level by level so depth never reaches the call stack
impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut entry) = pending.pop() {
            pending.append(&mut entry.children);
        }
    }
}

/// One row of a parent picker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
    pub disabled: bool,
}

/// Human-readable form of a key or label value
///
/// Strings are shown without quotes; other values as JSON.
pub fn key_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Canonical lookup key for a key or parent value
///
/// Two values get the same key exactly when an equality filter would
/// match them (`1`, `1.0` and `true` coincide; `1` and `"1"` do not).
/// `None` for null, which never matches anything.
pub fn match_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(format!("n:{}", i64::from(*b))),
        Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => format!("n:{}", i),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 9.0e15 => format!("n:{}", f as i64),
            (None, Some(f)) => format!("n:{}", f),
            (None, None) => format!("n:{}", n),
        }),
        Value::String(s) => Some(format!("t:{}", s)),
        other => Some(format!("t:{}", other)),
    }
}

/// True for parent references that mean "no parent"
///
/// `null`, `false`, `0`, `""`, `"0"` and empty arrays/objects.
pub fn is_empty_ref(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

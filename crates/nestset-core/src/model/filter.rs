//! Document filters and find options
//!
//! Value comparison follows SQLite's ordering of storage classes so that
//! the in-memory store and the SQLite store agree on every filter and sort:
//! null sorts first, then numbers (booleans count as 0/1), then text
//! (strings, and arrays/objects by their JSON text). A comparison that
//! involves a missing field or a JSON null never matches.

use std::cmp::Ordering;

use serde_json::Value;

use super::document::{DocId, Document};

/// Predicate over documents
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every document
    All,
    /// The document with this identity
    Id(DocId),
    Eq(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    /// Every sub-filter matches
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lt(field.into(), value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lte(field.into(), value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gt(field.into(), value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gte(field.into(), value.into())
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    /// Evaluate against a document
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(id) => &doc.id == id,
            Filter::Eq(field, value) => compare_field(doc, field, value) == Some(Ordering::Equal),
            Filter::Lt(field, value) => compare_field(doc, field, value) == Some(Ordering::Less),
            Filter::Lte(field, value) => matches!(
                compare_field(doc, field, value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Filter::Gt(field, value) => {
                compare_field(doc, field, value) == Some(Ordering::Greater)
            }
            Filter::Gte(field, value) => matches!(
                compare_field(doc, field, value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }

    /// Every field name referenced by this filter
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Filter::All | Filter::Id(_) => Vec::new(),
            Filter::Eq(field, _)
            | Filter::Lt(field, _)
            | Filter::Lte(field, _)
            | Filter::Gt(field, _)
            | Filter::Gte(field, _) => vec![field.as_str()],
            Filter::And(filters) => filters.iter().flat_map(Filter::fields).collect(),
        }
    }
}

fn compare_field(doc: &Document, field: &str, operand: &Value) -> Option<Ordering> {
    let value = doc.get(field)?;
    if value.is_null() || operand.is_null() {
        return None;
    }
    Some(compare_values(value, operand))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

/// Ordering and paging for `find`
///
/// Documents that compare equal on every sort key keep store-native order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Vec<SortKey>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ascending order on one field
    pub fn ordered_by(field: impl Into<String>) -> Self {
        Self::new().sort_by(field, Direction::Asc)
    }

    pub fn sort_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.sort.push(SortKey {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Sort (stably) and page documents given in store-native order
    pub fn apply(&self, mut docs: Vec<Document>) -> Vec<Document> {
        if !self.sort.is_empty() {
            docs.sort_by(|a, b| {
                for key in &self.sort {
                    let ord = sort_cmp(a.get(&key.field), b.get(&key.field));
                    let ord = match key.direction {
                        Direction::Asc => ord,
                        Direction::Desc => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        docs.into_iter()
            .skip(self.skip.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

fn sort_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let null = Value::Null;
    compare_values(a.unwrap_or(&null), b.unwrap_or(&null))
}

/// Total order over JSON values, by storage class first
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let (ca, cb) = (class(a), class(b));
    if ca != cb {
        return ca.cmp(&cb);
    }

    match ca {
        Class::Null => Ordering::Equal,
        Class::Numeric => compare_numbers(a, b),
        Class::Text => text_of(a).cmp(&text_of(b)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Class {
    Null,
    Numeric,
    Text,
}

fn class(value: &Value) -> Class {
    match value {
        Value::Null => Class::Null,
        Value::Bool(_) | Value::Number(_) => Class::Numeric,
        Value::String(_) | Value::Array(_) | Value::Object(_) => Class::Text,
    }
}

fn compare_numbers(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (as_integer(a), as_integer(b)) {
        return x.cmp(&y);
    }
    let x = as_float(a);
    let y = as_float(b);
    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

fn as_float(value: &Value) -> f64 {
    match value {
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, fields: Value) -> Document {
        Document::new(DocId::new(id), fields.as_object().cloned().unwrap())
    }

    #[test]
    fn test_class_order() {
        assert_eq!(compare_values(&json!(null), &json!(0)), Ordering::Less);
        assert_eq!(compare_values(&json!(99), &json!("1")), Ordering::Less);
        assert_eq!(compare_values(&json!(true), &json!(1)), Ordering::Equal);
        assert_eq!(compare_values(&json!(1.5), &json!(2)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
    }

    #[test]
    fn test_eq_is_type_strict() {
        let d = doc("d1", json!({"parent": "1"}));
        assert!(Filter::eq("parent", "1").matches(&d));
        assert!(!Filter::eq("parent", 1).matches(&d));
    }

    #[test]
    fn test_missing_and_null_never_match() {
        let d = doc("d1", json!({"parent": null}));
        assert!(!Filter::eq("parent", Value::Null).matches(&d));
        assert!(!Filter::lt("lft", 10).matches(&d));
        assert!(!Filter::gte("lft", 0).matches(&d));
    }

    #[test]
    fn test_range_and_conjunction() {
        let d = doc("d1", json!({"lft": 2, "rght": 5}));
        let inside = Filter::and(vec![Filter::gt("lft", 1), Filter::lt("rght", 6)]);
        let outside = Filter::and(vec![Filter::gt("lft", 1), Filter::lt("rght", 5)]);
        assert!(inside.matches(&d));
        assert!(!outside.matches(&d));
        assert!(Filter::lte("rght", 5).matches(&d));
        assert!(Filter::Id(DocId::new("d1")).matches(&d));
    }

    #[test]
    fn test_sort_is_stable_and_nulls_first() {
        let docs = vec![
            doc("a", json!({"pos": 2})),
            doc("b", json!({})),
            doc("c", json!({"pos": 1})),
            doc("d", json!({"pos": 2})),
        ];
        let sorted = FindOptions::ordered_by("pos").apply(docs);
        let ids: Vec<_> = sorted.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn test_skip_and_limit() {
        let docs = (0..5).map(|i| doc(&i.to_string(), json!({"n": i}))).collect();
        let page = FindOptions::new()
            .sort_by("n", Direction::Desc)
            .skip(1)
            .limit(2)
            .apply(docs);
        let ns: Vec<_> = page.iter().map(|d| d.get("n").cloned().unwrap()).collect();
        assert_eq!(ns, vec![json!(3), json!(2)]);
    }

    #[test]
    fn test_fields_lists_nested_names() {
        let filter = Filter::and(vec![Filter::eq("parent", "0"), Filter::gt("lft", 1)]);
        assert_eq!(filter.fields(), vec!["parent", "lft"]);
    }
}

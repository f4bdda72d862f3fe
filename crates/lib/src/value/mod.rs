//! Value types for stored documents.
//!
//! This module provides the [`Value`] enum that represents every node of a
//! stored document. Values are either scalars (null, booleans, numbers, text)
//! or containers (ordered lists and keyed maps).
//!
//! Containers are reference counted, so cloning a `Value` never copies a
//! subtree. Mutations in [`crate::tree`] rebuild only the containers on the
//! path to the change and share everything else with the input tree.
//!
//! # Element identity
//!
//! A [`Map`] that sits directly inside a [`List`] is addressed by its `id`
//! field instead of its position. Id comparison is loose: the allocated id `2`
//! and the path segment `"2"` refer to the same element. See [`ids_equal`].

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use serde_json::Number;

use crate::constants::ID_KEY;

mod conversions;

/// Ordered sequence of values.
pub type List = Arc<Vec<Value>>;

/// Keyed mapping of values, in insertion order.
pub type Map = Arc<IndexMap<String, Value>>;

/// A node in a stored document.
///
/// # Examples
///
/// ```
/// # use jsondepot::value::{Kind, Value};
/// let doc = Value::from(serde_json::json!({"posts": [{"id": 1, "title": "hi"}]}));
/// assert_eq!(doc.kind(), Kind::Map);
/// assert_eq!(doc.get("posts").map(Value::kind), Some(Kind::List));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// JSON `null`
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer or floating point number
    Number(Number),
    /// UTF-8 text
    Text(String),
    /// Ordered collection addressed by element id
    List(List),
    /// Keyed collection addressed by key
    Map(Map),
}

/// The variant of a [`Value`], used instead of ad hoc type inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Number,
    Text,
    List,
    Map,
}

impl Kind {
    /// Returns the kind name as used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Number => "number",
            Kind::Text => "text",
            Kind::List => "list",
            Kind::Map => "map",
        }
    }

    /// Returns true for lists and maps.
    pub fn is_container(&self) -> bool {
        matches!(self, Kind::List | Kind::Map)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a value. Every value has exactly one kind.
pub fn kind_of(value: &Value) -> Kind {
    match value {
        Value::Null => Kind::Null,
        Value::Bool(_) => Kind::Bool,
        Value::Number(_) => Kind::Number,
        Value::Text(_) => Kind::Text,
        Value::List(_) => Kind::List,
        Value::Map(_) => Kind::Map,
    }
}

impl Value {
    /// Builds a list value from its elements.
    pub fn list(elements: impl IntoIterator<Item = Value>) -> Self {
        Value::List(Arc::new(elements.into_iter().collect()))
    }

    /// Builds a map value from key/value pairs, keeping their order.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Returns an empty map value.
    pub fn empty_map() -> Self {
        Value::Map(Arc::default())
    }

    /// Returns the kind of this value.
    pub fn kind(&self) -> Kind {
        kind_of(self)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Returns true for values that count as "missing" when used as an id:
    /// `null`, `false`, zero and the empty string.
    ///
    /// Containers are never falsy.
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !*b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::Text(s) => s.is_empty(),
            Value::List(_) | Value::Map(_) => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the value as an unsigned integer, if it is one.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_number().and_then(Number::as_u64)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Returns the raw `id` field of a map, falsy or not.
    pub fn id(&self) -> Option<&Value> {
        self.get(ID_KEY)
    }

    /// Returns the `id` field of a map when it is present and truthy.
    pub fn element_id(&self) -> Option<&Value> {
        self.id().filter(|id| !id.is_falsy())
    }
}

/// Loose equality between two element ids.
///
/// The rules are:
/// - numbers compare numerically (`1` equals `1.0`)
/// - text compares exactly
/// - a number and a text are equal when the trimmed text parses to the same
///   number (`2` equals `"2"` and `" 2 "`, but not `"two"` or `""`)
/// - booleans equal only booleans, `null` equals only `null`
/// - lists and maps never equal anything
pub fn ids_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::Number(n), Value::Text(s)) | (Value::Text(s), Value::Number(n)) => {
            number_equals_text(n, s)
        }
        _ => false,
    }
}

/// Returns true when `id` addresses the path segment `segment`.
///
/// Equivalent to `ids_equal(id, &Value::Text(segment.into()))` without the
/// allocation.
pub fn id_matches_segment(id: &Value, segment: &str) -> bool {
    match id {
        Value::Text(s) => s == segment,
        Value::Number(n) => number_equals_text(n, segment),
        _ => false,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn number_equals_text(n: &Number, s: &str) -> bool {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return false;
    }
    if let (Some(a), Ok(b)) = (n.as_i64(), trimmed.parse::<i64>()) {
        return a == b;
    }
    if let (Some(a), Ok(b)) = (n.as_u64(), trimmed.parse::<u64>()) {
        return a == b;
    }
    match (n.as_f64(), trimmed.parse::<f64>()) {
        (Some(a), Ok(b)) => a == b,
        _ => false,
    }
}

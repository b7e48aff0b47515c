//! The untyped destination.
//!
//! Decoding into a [`Value`] keeps the shape of the document but drops what
//! only the syntax tree knows: numbers become `f64`. It is the type chosen for
//! a node when the destination says nothing more specific, such as the
//! elements of a `Vec<Value>` or a `Poly<dyn Trait>` with no registered
//! constructor.

use crate::de::Decode;
use crate::error::{Error, ErrorCode, Result};
use crate::map::Map;
use crate::node::Node;
use crate::options::Options;
use crate::registry::Abstract;
use std::ops;

/// Represents any valid JSON value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Represents a JSON null value.
    #[default]
    Null,

    /// Represents a JSON boolean.
    Bool(bool),

    /// Represents a JSON number.
    Number(f64),

    /// Represents a JSON string.
    String(String),

    /// Represents a JSON array.
    Array(Vec<Value>),

    /// Represents a JSON object.
    Object(Map<String, Value>),
}

static NULL: Value = Value::Null;

impl Value {
    /// Name of the Rust type held by this variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "()",
            Value::Bool(_) => "bool",
            Value::Number(_) => "f64",
            Value::String(_) => "String",
            Value::Array(_) => "Vec<Value>",
            Value::Object(_) => "Map<String, Value>",
        }
    }

    /// Returns true if the `Value` is a Null. Returns false otherwise.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// If the `Value` is a Boolean, returns the associated bool.
    /// Returns None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// If the `Value` is a Number, returns the associated f64.
    /// Returns None otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// If the `Value` is a String, returns the associated str.
    /// Returns None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// If the `Value` is an Array, returns the associated vector.
    /// Returns None otherwise.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// If the `Value` is an Object, returns the associated Map.
    /// Returns None otherwise.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Decodes `node` into the value its kind calls for, with no registry
    /// lookup at the top level.
    pub(crate) fn synthesize(node: &Node, opts: &Options) -> Result<Value> {
        Ok(match node {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(_) => {
                let mut n = 0f64;
                tri!(node.decode_with(&mut n, opts));
                Value::Number(n)
            }
            Node::String(_) => {
                let mut s = String::new();
                tri!(node.decode_with(&mut s, opts));
                Value::String(s)
            }
            Node::Array(_) => {
                let mut array = Vec::<Value>::new();
                tri!(node.decode_with(&mut array, opts));
                Value::Array(array)
            }
            Node::Object(_) => {
                let mut map = Map::<String, Value>::new();
                tri!(node.decode_with(&mut map, opts));
                Value::Object(map)
            }
        })
    }
}

impl Abstract for Value {
    fn from_value(value: Value) -> Option<Box<Self>> {
        Some(Box::new(value))
    }
}

impl Decode for Value {
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        let registry = opts.ctx().types();
        if let Some(constructor) = registry.lookup::<Value>() {
            tracing::trace!(kind = node.kind(), "calling registered constructor for Value");
            let value = tri!(constructor(node, opts.ctx()));
            *self = *value;
            return Ok(());
        }
        *self = tri!(Value::synthesize(node, opts));
        Ok(())
    }

    fn set_null(&mut self) {
        *self = Value::Null;
    }
}

/// Index into an object value by key. Missing keys and non-object values
/// yield `Value::Null`.
impl ops::Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        match self {
            Value::Object(map) => map.get(key).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

/// Index into an array value. Out of range indices and non-array values
/// yield `Value::Null`.
impl ops::Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        match self {
            Value::Array(array) => array.get(index).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(array: Vec<Value>) -> Self {
        Value::Array(array)
    }
}

impl From<Map<String, Value>> for Value {
    fn from(map: Map<String, Value>) -> Self {
        Value::Object(map)
    }
}

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Number(n) => Ok(n),
            other => Err(Error::data(ErrorCode::IncompatibleTypes(
                other.type_name(),
                "f64",
            ))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(Error::data(ErrorCode::IncompatibleTypes(
                other.type_name(),
                "String",
            ))),
        }
    }
}

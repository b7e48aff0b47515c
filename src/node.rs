//! The JSON syntax tree produced by the [`Parser`](crate::Parser).
//!
//! A [`Node`] owns its children; there is no sharing between subtrees and no
//! way back to the parent. Nodes are built by the parser, or by hand through
//! the `From` conversions below when a type constructor needs to synthesize
//! input for a nested decode.
//!
//! ```
//! use jtree::Node;
//!
//! let node = jtree::parse_str(r#"{"name": "disk", "sizes": [1, 2, 3,]}"#).unwrap();
//! let object = node.as_object().unwrap();
//! assert_eq!(object.keys().collect::<Vec<_>>(), ["name", "sizes"]);
//! assert_eq!(object.field_by_name("name"), Some(&Node::from("disk")));
//! assert_eq!(node["sizes"].as_array().map(Vec::len), Some(3));
//! ```

use crate::map::Map;
use crate::number::Number;
use std::fmt::{self, Debug};
use std::ops;

/// An object node: string keys in the order they first appeared, each mapped
/// to the last value given for it.
pub type Object = Map<String, Node>;

/// Represents any valid JSON value as parsed from text.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Node {
    /// Represents a JSON null value.
    #[default]
    Null,

    /// Represents a JSON boolean.
    Bool(bool),

    /// Represents a JSON number with the exact digits of the source text.
    Number(Number),

    /// Represents a JSON string with every escape sequence expanded.
    String(String),

    /// Represents a JSON array.
    Array(Vec<Node>),

    /// Represents a JSON object.
    Object(Object),
}

static NULL: Node = Node::Null;

impl Debug for Node {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Node::Null => formatter.write_str("Null"),
            Node::Bool(boolean) => write!(formatter, "Bool({})", boolean),
            Node::Number(number) => write!(formatter, "Number({})", number),
            Node::String(string) => write!(formatter, "String({:?})", string),
            Node::Array(vec) => {
                formatter.write_str("Array ")?;
                Debug::fmt(vec, formatter)
            }
            Node::Object(map) => {
                formatter.write_str("Object ")?;
                Debug::fmt(map, formatter)
            }
        }
    }
}

impl Node {
    /// Returns the name of the node kind: `"number"`, `"string"`, `"object"`,
    /// `"array"`, `"boolean"` or `"null"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Number(_) => "number",
            Node::String(_) => "string",
            Node::Array(_) => "array",
            Node::Object(_) => "object",
        }
    }

    /// Returns true if the node is `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    /// If the node is a boolean, returns it.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Node::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// If the node is a number, returns it.
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Node::Number(n) => Some(n),
            _ => None,
        }
    }

    /// If the node is a string, returns it.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// If the node is an array, returns its elements.
    pub fn as_array(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Array(array) => Some(array),
            _ => None,
        }
    }

    /// If the node is an object, returns it.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Node::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Looks up a member of an object node. Returns `None` if the node is not
    /// an object or the key is absent.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_object().and_then(|object| object.get(key))
    }
}

/// Index into an object node by key. Missing keys and non-object nodes yield
/// `Node::Null`.
impl ops::Index<&str> for Node {
    type Output = Node;

    fn index(&self, key: &str) -> &Node {
        self.get(key).unwrap_or(&NULL)
    }
}

/// Index into an array node. Out of range indices and non-array nodes yield
/// `Node::Null`.
impl ops::Index<usize> for Node {
    type Output = Node;

    fn index(&self, index: usize) -> &Node {
        match self {
            Node::Array(array) => array.get(index).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<Number> for Node {
    fn from(n: Number) -> Self {
        Node::Number(n)
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_owned())
    }
}

impl From<Vec<Node>> for Node {
    fn from(array: Vec<Node>) -> Self {
        Node::Array(array)
    }
}

impl From<Object> for Node {
    fn from(object: Object) -> Self {
        Node::Object(object)
    }
}

macro_rules! from_integer {
    ($($ty:ty)*) => {
        $(
            impl From<$ty> for Node {
                fn from(n: $ty) -> Self {
                    Node::Number(Number::from(n))
                }
            }
        )*
    };
}

from_integer! {
    i8 i16 i32 i64 isize
    u8 u16 u32 u64 usize
}

impl<T: Into<Node>> FromIterator<T> for Node {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Node::Array(iter.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Node {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Node::Object(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

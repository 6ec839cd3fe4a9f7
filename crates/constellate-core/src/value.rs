//! The document model: values, documents and links.
//!
//! A [`Document`] is a string-keyed map of [`Value`]s. Because it is a
//! `BTreeMap`, key order is always lexicographic, independent of the order
//! in which a producer inserted fields.

use std::collections::BTreeMap;
use std::fmt;

/// Reserved single key that marks a map as a [`Link`] on the wire.
pub const LINK_KEY: &str = "/";

/// A string-keyed map of values.
pub type Document = BTreeMap<String, Value>;

/// Build a [`Document`] from key/value pairs.
pub fn document<K, I>(entries: I) -> Document
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// A reference to another document: an address plus an optional remainder path.
///
/// The target is kept as the raw identifier string. Only a backend knows how
/// to turn it into a [`Cid`](crate::Cid), since backends disagree on the
/// textual encoding of digests.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link {
    target: String,
    path: String,
}

impl Link {
    /// Link to the root of a document.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            path: String::new(),
        }
    }

    /// Link to a path inside a document.
    pub fn with_path(target: impl Into<String>, path: impl AsRef<str>) -> Self {
        Self {
            target: target.into(),
            path: normalize_path(path.as_ref()),
        }
    }

    /// Parse `target[/remainder]`.
    pub fn parse(address: &str) -> Self {
        match address.split_once('/') {
            Some((target, path)) => Self::with_path(target, path),
            None => Self::new(address),
        }
    }

    /// The identifier of the linked document.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The path inside the linked document (empty for the root).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The flat `target[/path]` form written on the wire.
    pub fn address(&self) -> String {
        if self.path.is_empty() {
            self.target.clone()
        } else {
            format!("{}/{}", self.target, self.path)
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link({})", self.address())
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}

/// Strip leading, trailing and repeated separators.
pub(crate) fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// A document value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Array(Vec<Value>),
    Map(Document),
    Link(Link),
}

impl Value {
    /// Human-readable name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Link(_) => "link",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Document> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self {
            Value::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Value::Link(_))
    }

    /// Look up a key if this value is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Consume the value, returning the document if it is a map.
    pub fn into_map(self) -> Option<Document> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Link> for Value {
    fn from(link: Link) -> Self {
        Value::Link(link)
    }
}

impl From<Document> for Value {
    fn from(map: Document) -> Self {
        Value::Map(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::Array(iter.into_iter().map(Into::into).collect())
    }
}

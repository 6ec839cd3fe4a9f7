//! Codecs: turning documents into bytes and back, and walking paths inside them.

use std::fmt;
use std::str::FromStr;

use ciborium::value::Value as Cbor;
use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_cbor, canonical_json};
use crate::error::{CoreError, Result};
use crate::value::{normalize_path, Document, Link, Value, LINK_KEY};

/// The closed set of document codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Codec {
    /// Deterministic CBOR, used by block-store backends.
    DagCbor,
    /// Canonical JSON, used by ledger backends.
    DagJson,
}

impl Codec {
    /// Multicodec table code.
    pub const fn code(self) -> u64 {
        match self {
            Codec::DagCbor => 0x71,
            Codec::DagJson => 0x0129,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0x71 => Some(Codec::DagCbor),
            0x0129 => Some(Codec::DagJson),
            _ => None,
        }
    }

    /// Multicodec table name.
    pub const fn name(self) -> &'static str {
        match self {
            Codec::DagCbor => "dag-cbor",
            Codec::DagJson => "dag-json",
        }
    }

    /// Canonicalize and encode a document.
    pub fn encode(self, value: &Value) -> Result<Vec<u8>> {
        match self {
            Codec::DagCbor => canonical_cbor(value),
            Codec::DagJson => canonical_json(value),
        }
    }

    /// Decode bytes produced by [`Codec::encode`].
    pub fn decode(self, bytes: &[u8]) -> Result<Value> {
        match self {
            Codec::DagCbor => {
                let raw: Cbor = ciborium::from_reader(bytes)
                    .map_err(|e| CoreError::Decode(e.to_string()))?;
                from_cbor(raw)
            }
            Codec::DagJson => {
                let raw: serde_json::Value = serde_json::from_slice(bytes)
                    .map_err(|e| CoreError::Decode(e.to_string()))?;
                from_json(raw)
            }
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Codec {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dag-cbor" => Ok(Codec::DagCbor),
            "dag-json" => Ok(Codec::DagJson),
            other => Err(CoreError::UnknownCodec(other.to_string())),
        }
    }
}

/// A map with the single key `"/"` holding text is a link.
fn as_link_marker(map: &Document) -> Option<Link> {
    if map.len() != 1 {
        return None;
    }
    match map.get(LINK_KEY) {
        Some(Value::Text(address)) => Some(Link::parse(address)),
        _ => None,
    }
}

/// Any other map holding the link key is refused so decoding stays unambiguous.
fn finish_map(map: Document) -> Result<Value> {
    match as_link_marker(&map) {
        Some(link) => Ok(Value::Link(link)),
        None if map.contains_key(LINK_KEY) => Err(CoreError::Decode(
            "map uses the reserved link key".into(),
        )),
        None => Ok(Value::Map(map)),
    }
}

fn from_cbor(raw: Cbor) -> Result<Value> {
    Ok(match raw {
        Cbor::Null => Value::Null,
        Cbor::Bool(b) => Value::Bool(b),
        Cbor::Integer(i) => {
            let n: i128 = i.into();
            let n = i64::try_from(n)
                .map_err(|_| CoreError::Decode(format!("integer {} out of range", n)))?;
            Value::Integer(n)
        }
        Cbor::Float(f) => Value::Float(f),
        Cbor::Text(s) => Value::Text(s),
        Cbor::Array(items) => Value::Array(
            items
                .into_iter()
                .map(from_cbor)
                .collect::<Result<Vec<_>>>()?,
        ),
        Cbor::Map(entries) => {
            let mut map = Document::new();
            for (key, value) in entries {
                let key = match key {
                    Cbor::Text(k) => k,
                    other => {
                        return Err(CoreError::Decode(format!(
                            "map key must be text, got {:?}",
                            other
                        )))
                    }
                };
                map.insert(key, from_cbor(value)?);
            }
            finish_map(map)?
        }
        Cbor::Bytes(_) => return Err(CoreError::Decode("byte strings are not supported".into())),
        Cbor::Tag(tag, _) => return Err(CoreError::Decode(format!("unsupported tag {}", tag))),
        other => return Err(CoreError::Decode(format!("unsupported value {:?}", other))),
    })
}

fn from_json(raw: serde_json::Value) -> Result<Value> {
    Ok(match raw {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if n.is_u64() {
                return Err(CoreError::Decode(format!("integer {} out of range", n)));
            } else {
                Value::Float(n.as_f64().ok_or_else(|| CoreError::Decode(n.to_string()))?)
            }
        }
        serde_json::Value::String(s) => Value::Text(s),
        serde_json::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(from_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        serde_json::Value::Object(entries) => {
            let mut map = Document::new();
            for (key, value) in entries {
                map.insert(key, from_json(value)?);
            }
            finish_map(map)?
        }
    })
}

/// Outcome of resolving a path inside a single document.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// The value the walk stopped at.
    pub value: Value,
    /// Segments left unconsumed because the walk reached a link.
    pub remainder: String,
}

impl Resolved {
    /// Whether the path was fully consumed inside this document.
    pub fn is_complete(&self) -> bool {
        self.remainder.is_empty()
    }
}

/// Walk a `/`-delimited path through nested maps and arrays.
///
/// The walk stops early at a link: the link is returned together with the
/// segments it did not consume, since following it needs a backend.
pub fn resolve(value: &Value, path: &str) -> Result<Resolved> {
    let normalized = normalize_path(path);
    let segments: Vec<&str> = if normalized.is_empty() {
        Vec::new()
    } else {
        normalized.split('/').collect()
    };

    let mut current = value;
    for (index, segment) in segments.iter().enumerate() {
        let walked = || segments[..=index].join("/");
        current = match current {
            Value::Link(_) => {
                return Ok(Resolved {
                    value: current.clone(),
                    remainder: segments[index..].join("/"),
                });
            }
            Value::Array(items) => {
                let position: usize = segment.parse().map_err(|_| {
                    CoreError::path_not_found(walked(), "array index must be a decimal integer")
                })?;
                items.get(position).ok_or_else(|| {
                    CoreError::path_not_found(
                        walked(),
                        format!("index {} out of range for {} items", position, items.len()),
                    )
                })?
            }
            Value::Map(map) => map
                .get(*segment)
                .ok_or_else(|| CoreError::path_not_found(walked(), "no such key"))?,
            other => {
                return Err(CoreError::path_not_found(
                    walked(),
                    format!("cannot descend into {}", other.kind()),
                ))
            }
        };
    }

    Ok(Resolved {
        value: current.clone(),
        remainder: String::new(),
    })
}

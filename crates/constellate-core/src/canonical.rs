//! Canonical form and deterministic serialization.
//!
//! The canonical form of a value is unique:
//! - Map keys are sorted lexicographically (guaranteed by [`Document`])
//! - Arrays are sorted by [`canonical_cmp`], recursively
//!
//! Array sorting is structural, so two documents that differ only in the
//! order of array elements have the same canonical form and the same CID.
//!
//! The CBOR writer follows RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - Floats always as 64-bit, never NaN or infinite
//!
//! Both writers refuse to encode the same nested document twice in a single
//! pass (see [`CoreError::CircularReference`]). They also refuse a map that
//! uses the link key `"/"`, which would otherwise decode as a [`Link`].

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{CoreError, Result};
use crate::value::{Document, Link, Value, LINK_KEY};

/// Return the canonical form of a value.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut items: Vec<Value> = items.iter().map(canonicalize).collect();
            items.sort_by(canonical_cmp);
            Value::Array(items)
        }
        Value::Map(map) => Value::Map(canonicalize_document(map)),
        other => other.clone(),
    }
}

/// Return the canonical form of a document.
pub fn canonicalize_document(doc: &Document) -> Document {
    doc.iter()
        .map(|(k, v)| (k.clone(), canonicalize(v)))
        .collect()
}

/// Total order over canonical values.
///
/// Variants are ranked `null < bool < number < text < link < array < map`.
/// Numbers compare by value; an integer sorts before a float of equal value.
/// Arrays and maps compare element-wise, maps as their sorted `(key, value)`
/// sequence. Inputs are expected to be canonical already.
pub fn canonical_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
        (Value::Integer(x), Value::Float(y)) => (*x as f64).total_cmp(y).then(Ordering::Less),
        (Value::Float(x), Value::Integer(y)) => x.total_cmp(&(*y as f64)).then(Ordering::Greater),
        (Value::Text(x), Value::Text(y)) => x.as_bytes().cmp(y.as_bytes()),
        (Value::Link(x), Value::Link(y)) => x.address().cmp(&y.address()),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ord = canonical_cmp(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Map(x), Value::Map(y)) => {
            for ((lk, lv), (rk, rv)) in x.iter().zip(y.iter()) {
                let ord = lk
                    .as_bytes()
                    .cmp(rk.as_bytes())
                    .then_with(|| canonical_cmp(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Integer(_) | Value::Float(_) => 2,
        Value::Text(_) => 3,
        Value::Link(_) => 4,
        Value::Array(_) => 5,
        Value::Map(_) => 6,
    }
}

/// Canonicalize and encode a value as deterministic CBOR.
pub fn canonical_cbor(value: &Value) -> Result<Vec<u8>> {
    let canonical = canonicalize(value);
    let mut buf = Vec::new();
    Encoder::default().cbor(&mut buf, &canonical, &mut Vec::new(), true)?;
    Ok(buf)
}

/// Canonicalize and encode a value as compact JSON with sorted keys.
pub fn canonical_json(value: &Value) -> Result<Vec<u8>> {
    let canonical = canonicalize(value);
    let mut buf = Vec::new();
    Encoder::default().json(&mut buf, &canonical, &mut Vec::new(), true)?;
    Ok(buf)
}

/// One encode pass. Remembers a fingerprint of every nested document it has
/// written so a repeated sub-document is refused rather than written again.
#[derive(Default)]
struct Encoder {
    seen: HashSet<[u8; 32]>,
}

impl Encoder {
    fn check_keys(map: &Document, path: &[String]) -> Result<()> {
        if map.contains_key(LINK_KEY) {
            return Err(CoreError::Encode(format!(
                "map at /{} uses the reserved link key",
                path.join("/")
            )));
        }
        Ok(())
    }

    fn track(&mut self, encoded: &[u8], path: &[String]) -> Result<()> {
        let fingerprint = *blake3::hash(encoded).as_bytes();
        if !self.seen.insert(fingerprint) {
            return Err(CoreError::CircularReference {
                path: format!("/{}", path.join("/")),
            });
        }
        Ok(())
    }

    fn cbor(
        &mut self,
        buf: &mut Vec<u8>,
        value: &Value,
        path: &mut Vec<String>,
        root: bool,
    ) -> Result<()> {
        match value {
            Value::Null => buf.push(0xf6),
            Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
            Value::Integer(i) => encode_integer(buf, *i),
            Value::Float(f) => encode_float(buf, *f)?,
            Value::Text(s) => encode_text(buf, s),
            Value::Link(link) => encode_link(buf, link),
            Value::Array(items) => {
                encode_uint(buf, 4, items.len() as u64);
                for (index, item) in items.iter().enumerate() {
                    path.push(index.to_string());
                    self.cbor(buf, item, path, false)?;
                    path.pop();
                }
            }
            Value::Map(map) => {
                Self::check_keys(map, path)?;
                let mut encoded = Vec::new();
                self.cbor_map(&mut encoded, map, path)?;
                if !root && !map.is_empty() {
                    self.track(&encoded, path)?;
                }
                buf.extend_from_slice(&encoded);
            }
        }
        Ok(())
    }

    /// Encode a map canonically (major type 5).
    ///
    /// Keys are sorted by their encoded byte comparison.
    fn cbor_map(
        &mut self,
        buf: &mut Vec<u8>,
        map: &Document,
        path: &mut Vec<String>,
    ) -> Result<()> {
        let mut entries: Vec<(Vec<u8>, &String, &Value)> = map
            .iter()
            .map(|(k, v)| {
                let mut key_buf = Vec::new();
                encode_text(&mut key_buf, k);
                (key_buf, k, v)
            })
            .collect();

        entries.sort_by(|a, b| a.0.cmp(&b.0));

        encode_uint(buf, 5, entries.len() as u64);
        for (key_bytes, key, value) in entries {
            buf.extend_from_slice(&key_bytes);
            path.push(key.clone());
            self.cbor(buf, value, path, false)?;
            path.pop();
        }
        Ok(())
    }

    fn json(
        &mut self,
        buf: &mut Vec<u8>,
        value: &Value,
        path: &mut Vec<String>,
        root: bool,
    ) -> Result<()> {
        match value {
            Value::Null => buf.extend_from_slice(b"null"),
            Value::Bool(b) => buf.extend_from_slice(if *b { b"true" } else { b"false" }),
            Value::Integer(i) => buf.extend_from_slice(i.to_string().as_bytes()),
            Value::Float(f) => {
                let number = serde_json::Number::from_f64(*f)
                    .ok_or_else(|| CoreError::Encode(format!("non-finite float {}", f)))?;
                buf.extend_from_slice(number.to_string().as_bytes());
            }
            Value::Text(s) => write_json_string(buf, s)?,
            Value::Link(link) => {
                buf.push(b'{');
                write_json_string(buf, LINK_KEY)?;
                buf.push(b':');
                write_json_string(buf, &link.address())?;
                buf.push(b'}');
            }
            Value::Array(items) => {
                buf.push(b'[');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        buf.push(b',');
                    }
                    path.push(index.to_string());
                    self.json(buf, item, path, false)?;
                    path.pop();
                }
                buf.push(b']');
            }
            Value::Map(map) => {
                Self::check_keys(map, path)?;
                let mut encoded = Vec::new();
                encoded.push(b'{');
                for (index, (key, item)) in map.iter().enumerate() {
                    if index > 0 {
                        encoded.push(b',');
                    }
                    write_json_string(&mut encoded, key)?;
                    encoded.push(b':');
                    path.push(key.clone());
                    self.json(&mut encoded, item, path, false)?;
                    path.pop();
                }
                encoded.push(b'}');
                if !root && !map.is_empty() {
                    self.track(&encoded, path)?;
                }
                buf.extend_from_slice(&encoded);
            }
        }
        Ok(())
    }
}

fn write_json_string(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    let quoted = serde_json::to_string(s).map_err(|e| CoreError::Encode(e.to_string()))?;
    buf.extend_from_slice(quoted.as_bytes());
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, n: i64) {
    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - i128::from(n)) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn encode_float(buf: &mut Vec<u8>, f: f64) -> Result<()> {
    if !f.is_finite() {
        return Err(CoreError::Encode(format!("non-finite float {}", f)));
    }
    buf.push(0xfb);
    buf.extend_from_slice(&f.to_be_bytes());
    Ok(())
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// A link is a single-entry map `{"/": address}`.
fn encode_link(buf: &mut Vec<u8>, link: &Link) {
    encode_uint(buf, 5, 1);
    encode_text(buf, LINK_KEY);
    encode_text(buf, &link.address());
}

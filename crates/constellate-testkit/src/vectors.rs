//! Golden test vectors for deterministic verification.
//!
//! Each vector pairs a document with its expected canonical dag-cbor bytes
//! and canonical dag-json text. The bytes were worked out by hand from the
//! encoding rules, so any implementation can check itself against them.

use constellate_core::{canonical_cbor, canonical_json, document, Document, Link, Value};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Builds the input document.
    pub input: fn() -> Value,
    /// Expected canonical dag-cbor bytes (hex).
    pub cbor_hex: &'static str,
    /// Expected canonical dag-json text.
    pub json: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "map keys ordered by encoded length",
            input: || Value::Map(document([("bb", Value::from(1)), ("a", Value::from(2))])),
            // a2 | 61 'a' 02 | 62 'b' 'b' 01
            cbor_hex: "a261610262626201",
            json: r#"{"a":2,"bb":1}"#,
        },
        GoldenVector {
            // cbor puts the shorter key first, json sorts by text
            name: "cbor and json key orders differ",
            input: || Value::Map(document([("bb", Value::from(1)), ("c", Value::from(2))])),
            // a2 | 61 'c' 02 | 62 'b' 'b' 01
            cbor_hex: "a261630262626201",
            json: r#"{"bb":1,"c":2}"#,
        },
        GoldenVector {
            name: "link with path",
            input: || Value::Link(Link::with_path("abc", "x")),
            // a1 | 61 '/' | 65 'a' 'b' 'c' '/' 'x'
            cbor_hex: "a1612f656162632f78",
            json: r#"{"/":"abc/x"}"#,
        },
        GoldenVector {
            name: "array sorted by value",
            input: || Value::from_iter([3i64, 1, 2]),
            cbor_hex: "83010203",
            json: "[1,2,3]",
        },
        GoldenVector {
            name: "array sorted by variant rank",
            input: || {
                Value::Array(vec![
                    Value::from("x"),
                    Value::from(1),
                    Value::Null,
                    Value::from(true),
                ])
            },
            // 84 | f6 | f5 | 01 | 61 'x'
            cbor_hex: "84f6f5016178",
            json: r#"[null,true,1,"x"]"#,
        },
        GoldenVector {
            name: "negative integer and float",
            input: || Value::Map(document([("n", Value::from(-1)), ("f", Value::from(1.5))])),
            // a2 | 61 'f' fb 3ff8000000000000 | 61 'n' 20
            cbor_hex: "a26166fb3ff8000000000000616e20",
            json: r#"{"f":1.5,"n":-1}"#,
        },
        GoldenVector {
            name: "integer width boundaries",
            input: || Value::from_iter([23i64, 24, 256]),
            // 83 | 17 | 18 18 | 19 0100
            cbor_hex: "83171818190100",
            json: "[23,24,256]",
        },
        GoldenVector {
            name: "empty document",
            input: || Value::Map(Document::new()),
            cbor_hex: "a0",
            json: "{}",
        },
    ]
}

/// Check every vector against the canonical encoders.
///
/// Returns `(name, matches, actual cbor hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let value = (v.input)();
            let cbor = canonical_cbor(&value).map(hex::encode).unwrap_or_default();
            let json = canonical_json(&value).unwrap_or_default();

            let matches = cbor == v.cbor_hex && json == v.json.as_bytes();
            (v.name.to_string(), matches, cbor)
        })
        .collect()
}

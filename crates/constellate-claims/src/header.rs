//! Claim headers.

use constellate_core::{Algorithm, Document, Value};

use crate::error::SchemaError;
use crate::schema;

/// The `typ` every header carries.
pub const HEADER_TYPE: &str = "JWT";

/// A claim header: `{ alg, typ: "JWT" }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Header(Document);

impl Header {
    pub fn new(alg: Algorithm) -> Self {
        let mut doc = Document::new();
        doc.insert("alg".to_string(), Value::from(alg.as_str()));
        doc.insert("typ".to_string(), Value::from(HEADER_TYPE));
        Self(doc)
    }

    /// Wrap a received header document. Not checked until used.
    pub fn from_document(doc: Document) -> Self {
        Self(doc)
    }

    /// The signature algorithm, after a schema check.
    pub fn alg(&self) -> Result<Algorithm, SchemaError> {
        schema::check_header(&self.0)
    }

    pub fn document(&self) -> &Document {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Map(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_header_is_valid() {
        for alg in [Algorithm::EdDsa, Algorithm::Es256] {
            assert_eq!(Header::new(alg).alg().unwrap(), alg);
        }
    }

    #[test]
    fn test_received_header_checked_on_use() {
        let header = Header::from_document(Document::new());
        assert!(header.alg().is_err());
    }
}

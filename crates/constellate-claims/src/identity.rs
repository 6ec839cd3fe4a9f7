//! Self-identifying documents.
//!
//! A self-identifying document carries its own identifier in a reserved
//! field, computed over the document with that field removed. Anyone holding
//! the document can recompute the id and check it.

use constellate_core::{identify, CoreError, Document, Value};

use crate::error::SchemaError;

/// A document whose id is the hash of its own content.
pub trait Identifiable {
    /// The field holding the id.
    const ID_FIELD: &'static str;

    fn document(&self) -> &Document;

    fn document_mut(&mut self) -> &mut Document;

    /// Check the document against its schema.
    fn check_schema(&self) -> Result<(), SchemaError>;

    /// Hash of the canonical document with the id field absent.
    fn compute_id(&self) -> Result<String, CoreError> {
        let mut doc = self.document().clone();
        doc.remove(Self::ID_FIELD);
        identify(&Value::Map(doc))
    }

    /// Compute the id and write it into the id field.
    fn set_id(&mut self) -> Result<String, CoreError> {
        let id = self.compute_id()?;
        self.document_mut()
            .insert(Self::ID_FIELD.to_string(), Value::Text(id.clone()));
        Ok(id)
    }

    /// The id currently stored in the document.
    fn id(&self) -> Option<&str> {
        self.document().get(Self::ID_FIELD).and_then(Value::as_str)
    }

    /// Whether the stored id matches the content.
    fn has_valid_id(&self) -> Result<bool, CoreError> {
        let computed = self.compute_id()?;
        Ok(self.id() == Some(computed.as_str()))
    }
}

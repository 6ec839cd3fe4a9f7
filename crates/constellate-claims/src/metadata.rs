//! Typed metadata documents.
//!
//! Metadata describes people, organizations and musical works. Its `id` is
//! the hash of its own canonical content, so a metadata document certifies
//! itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use constellate_core::{Document, Value};

use crate::error::SchemaError;
use crate::identity::Identifiable;
use crate::schema;

/// The field naming a metadata document's kind.
pub const TYPE_FIELD: &str = "@type";

/// The closed set of metadata kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataKind {
    Person,
    Organization,
    MusicComposition,
    MusicRecording,
    MusicAlbum,
}

impl MetadataKind {
    pub const fn type_name(self) -> &'static str {
        match self {
            MetadataKind::Person => "Person",
            MetadataKind::Organization => "Organization",
            MetadataKind::MusicComposition => "MusicComposition",
            MetadataKind::MusicRecording => "MusicRecording",
            MetadataKind::MusicAlbum => "MusicAlbum",
        }
    }

    /// Fields whose identities may issue claims about metadata of this kind.
    pub const fn authorized_issuer_fields(self) -> &'static [&'static str] {
        match self {
            MetadataKind::MusicComposition => &["composer", "lyricist"],
            MetadataKind::MusicRecording => &["performer", "producer"],
            MetadataKind::MusicAlbum => &["byArtist", "producer"],
            MetadataKind::Person | MetadataKind::Organization => &[],
        }
    }
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for MetadataKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, SchemaError> {
        match s {
            "Person" => Ok(MetadataKind::Person),
            "Organization" => Ok(MetadataKind::Organization),
            "MusicComposition" => Ok(MetadataKind::MusicComposition),
            "MusicRecording" => Ok(MetadataKind::MusicRecording),
            "MusicAlbum" => Ok(MetadataKind::MusicAlbum),
            other => Err(SchemaError::new(
                TYPE_FIELD,
                format!("unknown metadata type {:?}", other),
            )),
        }
    }
}

/// A metadata document.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata(Document);

impl Metadata {
    pub fn new(doc: Document) -> Self {
        Self(doc)
    }

    /// Start a document of the given kind.
    pub fn of_kind(kind: MetadataKind) -> Self {
        let mut doc = Document::new();
        doc.insert(TYPE_FIELD.to_string(), Value::from(kind.type_name()));
        Self(doc)
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Wrap a value fetched from a backend.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        match value {
            Value::Map(doc) => Ok(Self(doc)),
            other => Err(SchemaError::new(
                "",
                format!("metadata must be a map, got {}", other.kind()),
            )),
        }
    }

    pub fn kind(&self) -> Result<MetadataKind, SchemaError> {
        let name = self
            .0
            .get(TYPE_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::new(TYPE_FIELD, "required field is missing"))?;
        name.parse()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Every identity listed in this kind's authorized-issuer fields.
    pub fn authorized_issuers(&self) -> Result<Vec<&str>, SchemaError> {
        let kind = self.kind()?;
        let mut issuers = Vec::new();
        for field in kind.authorized_issuer_fields() {
            if let Some(ids) = self.0.get(*field).and_then(schema::identities) {
                issuers.extend(ids);
            }
        }
        Ok(issuers)
    }

    pub fn to_value(&self) -> Value {
        Value::Map(self.0.clone())
    }

    pub fn into_document(self) -> Document {
        self.0
    }
}

impl Identifiable for Metadata {
    const ID_FIELD: &'static str = "id";

    fn document(&self) -> &Document {
        &self.0
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.0
    }

    fn check_schema(&self) -> Result<(), SchemaError> {
        schema::check_metadata(&self.0).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn composition() -> Metadata {
        Metadata::of_kind(MetadataKind::MusicComposition)
            .with("title", "fire-song")
            .with("composer", Value::from_iter(["amy", "zed"]))
            .with("lyricist", "lou")
    }

    #[test]
    fn test_set_id_is_self_certifying() {
        let mut meta = composition();
        assert!(meta.id().is_none());

        let id = meta.set_id().unwrap();
        assert_eq!(meta.id(), Some(id.as_str()));
        assert!(meta.has_valid_id().unwrap());
        // The id field itself is excluded from the hash.
        assert_eq!(meta.compute_id().unwrap(), id);
    }

    #[test]
    fn test_changed_content_invalidates_id() {
        let mut meta = composition();
        meta.set_id().unwrap();
        let tampered = meta.clone().with("title", "water-song");
        assert!(!tampered.has_valid_id().unwrap());
    }

    #[test]
    fn test_authorized_issuers() {
        let meta = composition().with("publisher", "pat");
        let issuers = meta.authorized_issuers().unwrap();
        assert_eq!(issuers, vec!["amy", "zed", "lou"]);
    }

    #[test]
    fn test_people_have_no_authorized_issuers() {
        let person = Metadata::of_kind(MetadataKind::Person).with("name", "amy");
        assert!(person.authorized_issuers().unwrap().is_empty());
        assert!(person.check_schema().is_ok());
    }

    #[test]
    fn test_kind_names_roundtrip() {
        for kind in [
            MetadataKind::Person,
            MetadataKind::Organization,
            MetadataKind::MusicComposition,
            MetadataKind::MusicRecording,
            MetadataKind::MusicAlbum,
        ] {
            assert_eq!(kind.type_name().parse::<MetadataKind>().unwrap(), kind);
        }
    }

    proptest! {
        #[test]
        fn prop_self_certification_roundtrip(
            title in "[a-z ]{1,24}",
            composers in proptest::collection::vec("[1-9A-HJ-NP-Za-km-z]{8,44}", 1..4),
        ) {
            let mut meta = Metadata::of_kind(MetadataKind::MusicComposition)
                .with("title", title)
                .with("composer", Value::from_iter(composers));
            let id = meta.set_id().unwrap();
            prop_assert_eq!(meta.compute_id().unwrap(), id);
            prop_assert!(meta.has_valid_id().unwrap());
        }
    }
}

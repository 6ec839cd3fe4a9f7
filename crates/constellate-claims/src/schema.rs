//! Closed field tables for metadata, claims and headers.
//!
//! Each table lists the fields a document kind must or may carry and the
//! shape of each field. Fields not in the table are allowed and unchecked.

use std::str::FromStr;

use constellate_core::{Algorithm, Document, Value};

use crate::claim::ClaimKind;
use crate::error::SchemaError;
use crate::metadata::{MetadataKind, TYPE_FIELD};

/// Shape of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    /// One identity or an array of identities.
    IdentityList,
    /// A link to another document, or its identifier as text.
    LinkOrText,
    /// An array of text.
    TextList,
}

/// One row of a field table.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
}

const fn req(name: &'static str, ty: FieldType) -> Field {
    Field {
        name,
        ty,
        required: true,
    }
}

const fn opt(name: &'static str, ty: FieldType) -> Field {
    Field {
        name,
        ty,
        required: false,
    }
}

use FieldType::*;

pub const PERSON: &[Field] = &[req("name", Text), opt("email", Text), opt("url", Text)];

pub const ORGANIZATION: &[Field] = &[
    req("name", Text),
    opt("member", IdentityList),
    opt("url", Text),
];

pub const MUSIC_COMPOSITION: &[Field] = &[
    req("title", Text),
    req("composer", IdentityList),
    opt("lyricist", IdentityList),
    opt("publisher", IdentityList),
    opt("iswcCode", Text),
    opt("genre", TextList),
];

pub const MUSIC_RECORDING: &[Field] = &[
    req("recordingOf", LinkOrText),
    req("performer", IdentityList),
    opt("producer", IdentityList),
    opt("title", Text),
    opt("isrcCode", Text),
    opt("duration", Integer),
    opt("genre", TextList),
];

pub const MUSIC_ALBUM: &[Field] = &[
    req("title", Text),
    req("byArtist", IdentityList),
    opt("producer", IdentityList),
    opt("numTracks", Integer),
    opt("genre", TextList),
];

pub const CLAIM: &[Field] = &[
    req("jti", Text),
    req("iss", Text),
    req("sub", Text),
    req("typ", Text),
    req("iat", Integer),
    opt("exp", Integer),
    opt("nbf", Integer),
    opt("aud", IdentityList),
];

/// Extra fields for license claims.
pub const LICENSE: &[Field] = &[req("aud", IdentityList)];

pub const HEADER: &[Field] = &[req("alg", Text), req("typ", Text)];

/// Field table for a metadata kind.
pub fn metadata_fields(kind: MetadataKind) -> &'static [Field] {
    match kind {
        MetadataKind::Person => PERSON,
        MetadataKind::Organization => ORGANIZATION,
        MetadataKind::MusicComposition => MUSIC_COMPOSITION,
        MetadataKind::MusicRecording => MUSIC_RECORDING,
        MetadataKind::MusicAlbum => MUSIC_ALBUM,
    }
}

/// Check every field of a table against a document.
pub fn check_fields(doc: &Document, fields: &[Field]) -> Result<(), SchemaError> {
    for field in fields {
        match doc.get(field.name) {
            Some(value) => check_type(field, value)?,
            None if field.required => {
                return Err(SchemaError::new(field.name, "required field is missing"))
            }
            None => {}
        }
    }
    Ok(())
}

fn check_type(field: &Field, value: &Value) -> Result<(), SchemaError> {
    let ok = match field.ty {
        Text => matches!(value, Value::Text(_)),
        Integer => matches!(value, Value::Integer(_)),
        IdentityList => identities(value).is_some(),
        LinkOrText => matches!(value, Value::Link(_) | Value::Text(_)),
        TextList => {
            matches!(value, Value::Array(items) if items.iter().all(|i| i.as_str().is_some()))
        }
    };
    if ok {
        Ok(())
    } else {
        Err(SchemaError::new(
            field.name,
            format!("expected {:?}, got {}", field.ty, value.kind()),
        ))
    }
}

/// Read an identity list: one text value or an array of text values.
pub fn identities(value: &Value) -> Option<Vec<&str>> {
    match value {
        Value::Text(s) => Some(vec![s.as_str()]),
        Value::Array(items) => items.iter().map(Value::as_str).collect(),
        _ => None,
    }
}

/// Check a metadata document and return its kind.
pub fn check_metadata(doc: &Document) -> Result<MetadataKind, SchemaError> {
    let type_name = doc
        .get(TYPE_FIELD)
        .ok_or_else(|| SchemaError::new(TYPE_FIELD, "required field is missing"))?
        .as_str()
        .ok_or_else(|| SchemaError::new(TYPE_FIELD, "expected Text"))?;
    let kind = MetadataKind::from_str(type_name).map_err(|_| {
        SchemaError::new(TYPE_FIELD, format!("unknown metadata type {:?}", type_name))
    })?;
    check_fields(doc, metadata_fields(kind))?;
    Ok(kind)
}

/// Check a claim document.
///
/// The base table always applies. Kind-specific tables apply only when `typ`
/// names a known kind; an unknown kind is reported by validation, not here.
pub fn check_claim(doc: &Document) -> Result<(), SchemaError> {
    check_fields(doc, CLAIM)?;

    let typ = doc.get("typ").and_then(Value::as_str).unwrap_or_default();
    if let Ok(ClaimKind::License) = ClaimKind::from_str(typ) {
        check_fields(doc, LICENSE)?;
        let empty = doc
            .get("aud")
            .and_then(identities)
            .map_or(true, |aud| aud.is_empty());
        if empty {
            return Err(SchemaError::new("aud", "a license needs at least one audience"));
        }
    }
    Ok(())
}

/// Check a header document and return its algorithm.
pub fn check_header(doc: &Document) -> Result<Algorithm, SchemaError> {
    check_fields(doc, HEADER)?;

    let typ = doc.get("typ").and_then(Value::as_str).unwrap_or_default();
    if typ != "JWT" {
        return Err(SchemaError::new("typ", format!("expected \"JWT\", got {:?}", typ)));
    }
    let alg = doc.get("alg").and_then(Value::as_str).unwrap_or_default();
    Algorithm::from_str(alg)
        .map_err(|_| SchemaError::new("alg", format!("unsupported algorithm {:?}", alg)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use constellate_core::{document, Link};

    fn composition() -> Document {
        document([
            ("@type", Value::from("MusicComposition")),
            ("title", Value::from("fire-song")),
            ("composer", Value::from_iter(["amy"])),
        ])
    }

    #[test]
    fn test_valid_composition() {
        assert_eq!(check_metadata(&composition()).unwrap(), MetadataKind::MusicComposition);
    }

    #[test]
    fn test_missing_required_field() {
        let mut doc = composition();
        doc.remove("composer");
        let err = check_metadata(&doc).unwrap_err();
        assert_eq!(err.field, "composer");
    }

    #[test]
    fn test_wrong_field_type() {
        let mut doc = composition();
        doc.insert("title".into(), Value::from(7));
        assert_eq!(check_metadata(&doc).unwrap_err().field, "title");
    }

    #[test]
    fn test_unknown_type() {
        let mut doc = composition();
        doc.insert("@type".into(), Value::from("Painting"));
        assert_eq!(check_metadata(&doc).unwrap_err().field, "@type");
    }

    #[test]
    fn test_identity_list_accepts_single_identity() {
        let mut doc = composition();
        doc.insert("composer".into(), Value::from("amy"));
        assert!(check_metadata(&doc).is_ok());

        doc.insert("composer".into(), Value::from_iter([Value::from(1)]));
        assert!(check_metadata(&doc).is_err());
    }

    #[test]
    fn test_recording_accepts_link() {
        let doc = document([
            ("@type", Value::from("MusicRecording")),
            ("recordingOf", Value::Link(Link::new("bafyabc"))),
            ("performer", Value::from("amy")),
        ]);
        assert_eq!(check_metadata(&doc).unwrap(), MetadataKind::MusicRecording);
    }

    fn claim(typ: &str) -> Document {
        document([
            ("jti", Value::from("id")),
            ("iss", Value::from("amy")),
            ("sub", Value::from("work")),
            ("typ", Value::from(typ)),
            ("iat", Value::from(1_000i64)),
        ])
    }

    #[test]
    fn test_claim_schema() {
        assert!(check_claim(&claim("Create")).is_ok());
        // unknown kinds pass the base table
        assert!(check_claim(&claim("Transfer")).is_ok());

        let mut doc = claim("Create");
        doc.insert("iat".into(), Value::from("yesterday"));
        assert_eq!(check_claim(&doc).unwrap_err().field, "iat");
    }

    #[test]
    fn test_license_needs_audience() {
        let mut doc = claim("License");
        assert_eq!(check_claim(&doc).unwrap_err().field, "aud");

        doc.insert("aud".into(), Value::Array(Vec::new()));
        assert_eq!(check_claim(&doc).unwrap_err().field, "aud");

        doc.insert("aud".into(), Value::from_iter(["bob"]));
        assert!(check_claim(&doc).is_ok());
    }

    #[test]
    fn test_header_schema() {
        let header = document([("alg", Value::from("ES256")), ("typ", Value::from("JWT"))]);
        assert_eq!(check_header(&header).unwrap(), Algorithm::Es256);

        let header = document([("alg", Value::from("RS256")), ("typ", Value::from("JWT"))]);
        assert_eq!(check_header(&header).unwrap_err().field, "alg");

        let header = document([("alg", Value::from("EdDsa")), ("typ", Value::from("JWS"))]);
        assert_eq!(check_header(&header).unwrap_err().field, "typ");
    }
}

//! Claims: signed, self-identifying assertions about metadata.
//!
//! Wire shape: `{ jti, iss, sub, typ, iat, exp?, nbf?, aud? }`. Timestamps
//! are Unix milliseconds. `jti` is computed over the claim with `jti`
//! removed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use constellate_core::{now_millis, CoreError, Document, Value};

use crate::error::{ClaimViolation, SchemaError};
use crate::identity::Identifiable;
use crate::schema;

/// The closed set of claim kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimKind {
    /// The issuer created the subject.
    Create,
    /// The issuer licenses the subject to the audience.
    License,
}

impl ClaimKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ClaimKind::Create => "Create",
            ClaimKind::License => "License",
        }
    }
}

impl fmt::Display for ClaimKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimKind {
    type Err = ClaimViolation;

    fn from_str(s: &str) -> Result<Self, ClaimViolation> {
        match s {
            "Create" => Ok(ClaimKind::Create),
            "License" => Ok(ClaimKind::License),
            other => Err(ClaimViolation::UnknownKind(other.to_string())),
        }
    }
}

/// A claim document.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim(Document);

impl Claim {
    /// Start building a claim by `issuer` about the metadata `subject`.
    pub fn builder(
        kind: ClaimKind,
        issuer: impl Into<String>,
        subject: impl Into<String>,
    ) -> ClaimBuilder {
        ClaimBuilder::new(kind, issuer, subject)
    }

    /// Wrap a received claim document. Not checked until validated.
    pub fn from_document(doc: Document) -> Self {
        Self(doc)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.0.get("iss").and_then(Value::as_str)
    }

    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    /// The raw `typ` field.
    pub fn kind_name(&self) -> Option<&str> {
        self.0.get("typ").and_then(Value::as_str)
    }

    pub fn kind(&self) -> Result<ClaimKind, ClaimViolation> {
        self.kind_name().unwrap_or_default().parse()
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.0.get("iat").and_then(Value::as_i64)
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.0.get("exp").and_then(Value::as_i64)
    }

    pub fn not_before(&self) -> Option<i64> {
        self.0.get("nbf").and_then(Value::as_i64)
    }

    /// Audience identities; empty when `aud` is absent.
    pub fn audience(&self) -> Vec<&str> {
        self.0
            .get("aud")
            .and_then(schema::identities)
            .unwrap_or_default()
    }

    pub fn to_value(&self) -> Value {
        Value::Map(self.0.clone())
    }

    pub fn into_document(self) -> Document {
        self.0
    }
}

impl Identifiable for Claim {
    const ID_FIELD: &'static str = "jti";

    fn document(&self) -> &Document {
        &self.0
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.0
    }

    fn check_schema(&self) -> Result<(), SchemaError> {
        schema::check_claim(&self.0)
    }
}

/// Builder for [`Claim`]s.
#[derive(Debug, Clone)]
pub struct ClaimBuilder {
    doc: Document,
    issued_at: Option<i64>,
}

impl ClaimBuilder {
    pub fn new(kind: ClaimKind, issuer: impl Into<String>, subject: impl Into<String>) -> Self {
        let mut doc = Document::new();
        doc.insert("typ".into(), Value::from(kind.as_str()));
        doc.insert("iss".into(), Value::from(issuer.into()));
        doc.insert("sub".into(), Value::from(subject.into()));
        Self {
            doc,
            issued_at: None,
        }
    }

    /// Issue time in Unix milliseconds. Defaults to now.
    pub fn issued_at(mut self, iat: i64) -> Self {
        self.issued_at = Some(iat);
        self
    }

    pub fn expires_at(mut self, exp: i64) -> Self {
        self.doc.insert("exp".into(), Value::from(exp));
        self
    }

    pub fn not_before(mut self, nbf: i64) -> Self {
        self.doc.insert("nbf".into(), Value::from(nbf));
        self
    }

    pub fn audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let aud: Value = audience
            .into_iter()
            .map(|identity| Value::Text(identity.into()))
            .collect();
        self.doc.insert("aud".into(), aud);
        self
    }

    /// Any additional field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.doc.insert(name.into(), value.into());
        self
    }

    /// Finish the claim and compute its `jti`.
    pub fn build(self) -> Result<Claim, CoreError> {
        let mut doc = self.doc;
        doc.insert(
            "iat".into(),
            Value::from(self.issued_at.unwrap_or_else(now_millis)),
        );
        let mut claim = Claim(doc);
        claim.set_id()?;
        Ok(claim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_sets_jti() {
        let claim = Claim::builder(ClaimKind::Create, "amy", "work")
            .issued_at(1_000)
            .build()
            .unwrap();

        assert!(claim.has_valid_id().unwrap());
        assert_eq!(claim.issuer(), Some("amy"));
        assert_eq!(claim.subject(), Some("work"));
        assert_eq!(claim.kind().unwrap(), ClaimKind::Create);
        assert_eq!(claim.issued_at(), Some(1_000));
        assert!(claim.expires_at().is_none());
        assert!(claim.audience().is_empty());
        assert!(claim.check_schema().is_ok());
    }

    #[test]
    fn test_jti_ignores_field_order() {
        let a = Claim::builder(ClaimKind::License, "amy", "work")
            .issued_at(1_000)
            .audience(["bob", "cat"])
            .expires_at(9_000)
            .build()
            .unwrap();
        let b = Claim::builder(ClaimKind::License, "amy", "work")
            .expires_at(9_000)
            .audience(["cat", "bob"])
            .issued_at(1_000)
            .build()
            .unwrap();
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_default_issue_time_is_now() {
        let before = now_millis();
        let claim = Claim::builder(ClaimKind::Create, "amy", "work").build().unwrap();
        assert!(claim.issued_at().unwrap() >= before);
    }

    #[test]
    fn test_unknown_kind() {
        let mut doc = Claim::builder(ClaimKind::Create, "amy", "work")
            .build()
            .unwrap()
            .into_document();
        doc.insert("typ".into(), Value::from("Transfer"));
        let claim = Claim::from_document(doc);
        assert_eq!(
            claim.kind().unwrap_err(),
            ClaimViolation::UnknownKind("Transfer".into())
        );
    }
}

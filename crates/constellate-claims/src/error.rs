//! Error types for the claims module.

use constellate_core::{Algorithm, CoreError};
use thiserror::Error;

/// A document failed its schema check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}`: {reason}")]
pub struct SchemaError {
    pub field: String,
    pub reason: String,
}

impl SchemaError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// The first check a claim failed during validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimViolation {
    #[error("metadata schema: {0}")]
    MetadataSchema(SchemaError),

    #[error("metadata id {actual:?} does not match its content ({expected})")]
    MetadataIdMismatch { expected: String, actual: Option<String> },

    #[error("claim schema: {0}")]
    ClaimSchema(SchemaError),

    #[error("unknown claim kind {0:?}")]
    UnknownKind(String),

    #[error("issued at {iat}, after current time {now}")]
    IssuedInFuture { iat: i64, now: i64 },

    #[error("issuer {iss} is listed in the audience")]
    IssuerInAudience { iss: String },

    #[error("expiry {exp} is not after issue time {iat}")]
    ExpiryBeforeIssue { exp: i64, iat: i64 },

    #[error("expiry {exp} is not after not-before {nbf}")]
    ExpiryBeforeNotBefore { exp: i64, nbf: i64 },

    #[error("expired at {exp} (now {now})")]
    Expired { exp: i64, now: i64 },

    #[error("not-before {nbf} is not after issue time {iat}")]
    NotBeforeBeforeIssue { nbf: i64, iat: i64 },

    #[error("not valid before {nbf} (now {now})")]
    NotYetValid { nbf: i64, now: i64 },

    #[error("claim id {actual} does not match its content ({expected})")]
    ClaimIdMismatch { expected: String, actual: String },

    #[error("claim subject {sub} is not metadata {metadata_id}")]
    SubjectMismatch { sub: String, metadata_id: String },

    #[error("issuer {iss} is not authorized for {kind} metadata")]
    IssuerNotAuthorized { iss: String, kind: String },
}

/// Errors that can occur while building, signing or verifying claims.
#[derive(Debug, Error)]
pub enum ClaimsError {
    /// A header, claim or metadata document is malformed.
    #[error("invalid schema: {0}")]
    InvalidSchema(#[from] SchemaError),

    /// A claim failed validation.
    #[error("invalid claim: {0}")]
    InvalidClaim(#[from] ClaimViolation),

    /// The signature does not match the signing input and issuer key.
    #[error("invalid signature")]
    InvalidSignature,

    /// The header's algorithm does not match the key.
    #[error("algorithm mismatch: header says {header}, key is {key}")]
    AlgorithmMismatch { header: Algorithm, key: Algorithm },

    /// The issuer identity is not a public key.
    #[error("invalid issuer identity: {0}")]
    InvalidIssuer(String),

    /// Encoding or identifier computation failed.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for claims operations.
pub type Result<T> = std::result::Result<T, ClaimsError>;

//! Error types for the registry.

use constellate_claims::{ClaimsError, SchemaError};
use constellate_core::CoreError;
use constellate_resolver::ResolveError;
use constellate_store::StoreError;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Encoding, addressing or signature primitive failure.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Path resolution or expansion error.
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Schema, validation or signature error from the claims engine.
    #[error("claims error: {0}")]
    Claims(#[from] ClaimsError),

    /// A stored document does not have the expected shape.
    #[error("not a {expected} document")]
    UnexpectedDocument { expected: &'static str },
}

impl From<SchemaError> for RegistryError {
    fn from(e: SchemaError) -> Self {
        RegistryError::Claims(ClaimsError::InvalidSchema(e))
    }
}

impl RegistryError {
    /// Whether the error is a claim validation failure, as opposed to a bad
    /// signature or an infrastructure problem.
    pub fn is_invalid_claim(&self) -> bool {
        matches!(self, RegistryError::Claims(ClaimsError::InvalidClaim(_)))
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

//! Error types for the store module.

use constellate_core::{Codec, CoreError, Version};
use thiserror::Error;

/// Errors that can occur during backend operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Encoding, decoding or address parsing failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The ledger file was created with a different codec or digest algorithm.
    #[error("ledger was written with {setting} {found}, expected {expected}")]
    IncompatibleLedger {
        setting: &'static str,
        expected: String,
        found: String,
    },

    /// No document is stored under this identifier.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The CID names a codec this backend does not store.
    #[error("unexpected codec: expected {expected}, got {actual}")]
    UnexpectedCodec { expected: Codec, actual: Codec },

    /// The CID has a version this backend does not store.
    #[error("unexpected CID version: expected {expected:?}, got {actual:?}")]
    UnexpectedVersion { expected: Version, actual: Version },

    /// Stored bytes no longer hash to the identifier they were stored under.
    #[error("unexpected hash: expected {expected}, got {actual}")]
    UnexpectedHash { expected: String, actual: String },

    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A backend call did not finish in time.
    #[error("backend call timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Malformed data in storage.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

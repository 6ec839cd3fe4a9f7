//! Error types for Constellate Core.

use thiserror::Error;

/// Core errors raised by encoding, decoding, path resolution and signatures.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    Encode(String),

    /// The same nested document was reached twice during one encode pass.
    #[error("circular reference at {path}")]
    CircularReference { path: String },

    #[error("decoding error: {0}")]
    Decode(String),

    #[error("path not found: {path} ({reason})")]
    PathNotFound { path: String, reason: String },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unknown codec: {0}")]
    UnknownCodec(String),

    #[error("unsupported hash algorithm: {0:#x}")]
    UnsupportedHash(u64),

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid key seed")]
    InvalidSeed,

    #[error("unknown signature algorithm: {0}")]
    UnknownAlgorithm(String),
}

impl CoreError {
    pub(crate) fn path_not_found(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::PathNotFound {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

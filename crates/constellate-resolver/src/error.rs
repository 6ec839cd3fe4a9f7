//! Error types for the resolver.

use constellate_core::CoreError;
use constellate_store::StoreError;
use thiserror::Error;

/// Errors that can occur while resolving paths or expanding documents.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Path walking, address parsing or decoding failed.
    #[error(transparent)]
    Core(CoreError),

    /// The backend failed.
    #[error("store error: {0}")]
    Store(StoreError),

    /// A path kept crossing links past the configured limit.
    #[error("too many link hops (limit {limit})")]
    TooManyHops { limit: usize },

    /// `expand` reached an address that is already being expanded on the
    /// same branch.
    #[error("link cycle detected at {address}")]
    CycleDetected { address: String },

    /// `expand` followed more nested links than allowed.
    #[error("expansion deeper than {limit} links")]
    MaxDepthExceeded { limit: usize },
}

impl ResolveError {
    /// Whether this is a path-not-found failure.
    pub fn is_path_not_found(&self) -> bool {
        matches!(self, ResolveError::Core(CoreError::PathNotFound { .. }))
    }
}

impl From<CoreError> for ResolveError {
    fn from(e: CoreError) -> Self {
        ResolveError::Core(e)
    }
}

impl From<StoreError> for ResolveError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Core(core) => ResolveError::Core(core),
            other => ResolveError::Store(other),
        }
    }
}

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

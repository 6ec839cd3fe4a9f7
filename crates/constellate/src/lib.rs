//! # Constellate
//!
//! A content-addressed registry for linked creative-works metadata and the
//! signed claims made about it.
//!
//! ## Overview
//!
//! - **Documents** are canonicalized and addressed by CID, so any party can
//!   recompute an address from content alone.
//! - **Links** let one document point into another; the resolver follows
//!   them across documents and backends.
//! - **Metadata** (people, compositions, recordings, ...) is self-certifying:
//!   its `id` is the CID of its own content.
//! - **Claims** are signed statements by an issuer about a metadata id,
//!   checked against who the metadata says may speak for it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use constellate::{Registry, RegistryConfig, ValidityWindow};
//! use constellate::core::{Algorithm, Keypair, Value};
//! use constellate::claims::{ClaimKind, Metadata, MetadataKind};
//! use constellate::store::SqliteBackend;
//!
//! async fn example() -> constellate::Result<()> {
//!     let keypair = Keypair::generate(Algorithm::EdDsa);
//!     let backend = SqliteBackend::open("registry.db")?;
//!     let registry = Registry::new(keypair, backend, RegistryConfig::default());
//!
//!     let song = Metadata::of_kind(MetadataKind::MusicComposition)
//!         .with("title", "fire-song")
//!         .with("composer", Value::from_iter([registry.identity()]));
//!     let published = registry.publish(song).await?;
//!
//!     let metadata = registry.fetch_metadata(&published.cid).await?;
//!     let claim = registry.issue(ClaimKind::Create, &metadata, &[], ValidityWindow::default())?;
//!     registry.verify(&claim, &published.cid).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `constellate::core` - document model, canonical codec, CIDs, keys
//! - `constellate::store` - backend contract, block store, SQLite ledger
//! - `constellate::resolver` - path resolution and link expansion
//! - `constellate::claims` - metadata, claims, validation, signatures

pub mod error;
pub mod registry;

// Re-export component crates
pub use constellate_claims as claims;
pub use constellate_core as core;
pub use constellate_resolver as resolver;
pub use constellate_store as store;

// Re-export main types for convenience
pub use error::{RegistryError, Result};
pub use registry::{Published, Registry, RegistryConfig, ValidityWindow};

// Re-export commonly used types
pub use constellate_claims::{ClaimKind, Metadata, MetadataKind, SignedClaim};
pub use constellate_core::{Algorithm, Cid, Keypair, Link, Value};
pub use constellate_store::Backend;

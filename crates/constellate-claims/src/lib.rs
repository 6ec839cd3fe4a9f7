//! # Constellate Claims
//!
//! Self-identifying metadata and signed claims about it.
//!
//! ## Overview
//!
//! Metadata (a composition, a recording, a person) carries an `id` equal to
//! the hash of its own canonical content. A claim is a JWT-like assertion by
//! an issuer about one piece of metadata: "I created this", "I license this
//! to these parties". Claims identify themselves the same way through `jti`.
//!
//! ## Key Concepts
//!
//! - **Identifiable**: documents whose id is computed from their content
//! - **Role table**: which metadata fields list the parties allowed to issue
//!   claims about it (composer/lyricist for a composition, and so on)
//! - **Signing input**: `base64url(canon(header)).base64url(canon(claim))`
//! - **Issuer identity**: the base58 public key of the signing key
//!
//! ## Usage
//!
//! ```rust
//! use constellate_claims::{Claim, ClaimKind, Identifiable, Metadata, MetadataKind, SignedClaim};
//! use constellate_core::{Algorithm, Keypair, Value};
//!
//! let composer = Keypair::generate(Algorithm::EdDsa);
//!
//! let mut song = Metadata::of_kind(MetadataKind::MusicComposition)
//!     .with("title", "fire-song")
//!     .with("composer", Value::from_iter([composer.identity()]));
//! song.set_id().unwrap();
//!
//! let claim = Claim::builder(ClaimKind::Create, composer.identity(), song.id().unwrap())
//!     .build()
//!     .unwrap();
//! let signed = SignedClaim::sign(claim, &composer).unwrap();
//! signed.verify(&song).unwrap();
//! ```

pub mod claim;
pub mod error;
pub mod header;
pub mod identity;
pub mod metadata;
pub mod schema;
pub mod sign;
pub mod validate;

pub use claim::{Claim, ClaimBuilder, ClaimKind};
pub use error::{ClaimViolation, ClaimsError, Result, SchemaError};
pub use header::{Header, HEADER_TYPE};
pub use identity::Identifiable;
pub use metadata::{Metadata, MetadataKind, TYPE_FIELD};
pub use sign::{signing_input, sign_claim, verify_claim, verify_claim_at, SignedClaim};
pub use validate::{validate_claim, validate_claim_at};

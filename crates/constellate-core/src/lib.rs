//! # Constellate Core
//!
//! Pure primitives for Constellate: the document model, canonical encoding,
//! content identifiers and signatures.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over documents.
//!
//! ## Key Types
//!
//! - [`Value`] / [`Document`] - The document model
//! - [`Link`] - A reference from one document to (a path inside) another
//! - [`Codec`] - `dag-cbor` or `dag-json`
//! - [`Cid`] - Content identifier derived from canonical bytes
//! - [`Keypair`] / [`PublicKey`] - Ed25519 and secp256k1 signing
//!
//! ## Canonicalization
//!
//! Every document is canonicalized before it is encoded, so two documents
//! with the same content always produce the same bytes. See [`canonical`].

pub mod canonical;
pub mod cid;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod value;

pub use crate::canonical::{canonical_cbor, canonical_cmp, canonical_json, canonicalize};
pub use crate::cid::{identify, split_address, Cid, HashAlgorithm, Multihash, Version};
pub use crate::codec::{resolve, Codec, Resolved};
pub use crate::crypto::{Algorithm, Keypair, PublicKey, Signature};
pub use crate::error::{CoreError, Result};
pub use crate::value::{document, Document, Link, Value, LINK_KEY};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time in milliseconds since the Unix epoch.
///
/// See [`millis_since_epoch`] for clocks set before the epoch.
pub fn now_millis() -> i64 {
    millis_since_epoch(SystemTime::now())
}

/// Milliseconds between the Unix epoch and `time`.
///
/// A time before the epoch gives a negative count rather than zero, so a
/// badly set clock still compares correctly against `nbf` and `exp`.
/// Counts beyond the `i64` range saturate.
pub fn millis_since_epoch(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_millis()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_millis())
            .map(|ms| -ms)
            .unwrap_or(i64::MIN),
    }
}

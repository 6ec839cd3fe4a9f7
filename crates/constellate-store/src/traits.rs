//! Backend trait: the contract every content-addressable store satisfies.
//!
//! The resolver and the claims engine depend only on this trait. A backend
//! decides which codec it stores documents in and how a CID is written as
//! text; everything else (canonical encoding, path walking) is shared.

use std::sync::Arc;

use async_trait::async_trait;
use constellate_core::{Cid, Codec, HashAlgorithm, Resolved, Value, Version};

use crate::error::{Result, StoreError};

/// Async interface for document persistence.
///
/// # Contract
///
/// - `put` is idempotent: storing the same document twice yields the same CID.
/// - `get` rejects a CID whose codec or version this backend does not store
///   before touching storage.
/// - `hash` computes the identifier `put` would return, without persisting.
/// - `address_to_cid` and `cid_to_address` round-trip through the backend's
///   textual address form.
#[async_trait]
pub trait Backend: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    /// The codec documents are stored in.
    fn codec(&self) -> Codec;

    /// The digest algorithm used for identifiers.
    fn hash_algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha2_256
    }

    /// The CID version this backend issues.
    fn version(&self) -> Version {
        Version::V1
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Storage
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist a document and return its CID.
    async fn put(&self, value: &Value) -> Result<Cid>;

    /// Fetch the document stored under a CID.
    async fn get(&self, cid: &Cid) -> Result<Value>;

    // ─────────────────────────────────────────────────────────────────────────
    // Addressing
    // ─────────────────────────────────────────────────────────────────────────

    /// Parse a textual address into a CID and a remainder path.
    fn address_to_cid(&self, address: &str) -> Result<(Cid, String)>;

    /// Write a CID in this backend's textual address form.
    fn cid_to_address(&self, cid: &Cid) -> Result<String>;

    /// The CID `put` would assign to a document.
    fn compute_cid(&self, value: &Value) -> Result<Cid> {
        Ok(Cid::compute(value, self.codec(), self.hash_algorithm())?)
    }

    /// The identifier `put` would return for a document, without persisting it.
    fn hash(&self, value: &Value) -> Result<String> {
        self.cid_to_address(&self.compute_cid(value)?)
    }

    /// Walk a path inside a document fetched from this backend.
    fn resolve(&self, value: &Value, path: &str) -> Result<Resolved> {
        Ok(constellate_core::resolve(value, path)?)
    }

    /// Reject CIDs this backend cannot hold.
    fn check_cid(&self, cid: &Cid) -> Result<()> {
        if cid.codec() != self.codec() {
            return Err(StoreError::UnexpectedCodec {
                expected: self.codec(),
                actual: cid.codec(),
            });
        }
        if cid.version() != self.version() {
            return Err(StoreError::UnexpectedVersion {
                expected: self.version(),
                actual: cid.version(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn codec(&self) -> Codec {
        (**self).codec()
    }

    fn hash_algorithm(&self) -> HashAlgorithm {
        (**self).hash_algorithm()
    }

    fn version(&self) -> Version {
        (**self).version()
    }

    async fn put(&self, value: &Value) -> Result<Cid> {
        (**self).put(value).await
    }

    async fn get(&self, cid: &Cid) -> Result<Value> {
        (**self).get(cid).await
    }

    fn address_to_cid(&self, address: &str) -> Result<(Cid, String)> {
        (**self).address_to_cid(address)
    }

    fn cid_to_address(&self, cid: &Cid) -> Result<String> {
        (**self).cid_to_address(cid)
    }

    fn compute_cid(&self, value: &Value) -> Result<Cid> {
        (**self).compute_cid(value)
    }

    fn hash(&self, value: &Value) -> Result<String> {
        (**self).hash(value)
    }

    fn resolve(&self, value: &Value, path: &str) -> Result<Resolved> {
        (**self).resolve(value, path)
    }

    fn check_cid(&self, cid: &Cid) -> Result<()> {
        (**self).check_cid(cid)
    }
}

/// Re-hash stored bytes and compare them with the CID they were stored under.
pub(crate) fn verify_block(cid: &Cid, bytes: &[u8]) -> Result<()> {
    let actual = Cid::for_bytes(bytes, cid.codec(), cid.multihash().algorithm());
    if &actual != cid {
        return Err(StoreError::UnexpectedHash {
            expected: cid.to_hex(),
            actual: actual.to_hex(),
        });
    }
    Ok(())
}

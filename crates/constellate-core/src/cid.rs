//! Content identifiers.
//!
//! A [`Cid`] is `(version, codec, multihash)` computed from a document's
//! canonical bytes. Two documents with the same canonical form always get
//! the same CID under the same codec and hash algorithm.
//!
//! Backends disagree on the textual form: block stores use multibase CID
//! strings, ledgers use the bare digest in hex. Both are provided here and a
//! backend picks one.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::codec::Codec;
use crate::error::{CoreError, Result};
use crate::value::{normalize_path, Value};

/// CID version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Version {
    V0,
    V1,
}

impl Version {
    pub const fn as_u64(self) -> u64 {
        match self {
            Version::V0 => 0,
            Version::V1 => 1,
        }
    }
}

/// The closed set of digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    Sha2_256,
    Blake3,
}

impl HashAlgorithm {
    /// Multihash table code.
    pub const fn code(self) -> u64 {
        match self {
            HashAlgorithm::Sha2_256 => 0x12,
            HashAlgorithm::Blake3 => 0x1e,
        }
    }

    pub fn from_code(code: u64) -> Result<Self> {
        match code {
            0x12 => Ok(HashAlgorithm::Sha2_256),
            0x1e => Ok(HashAlgorithm::Blake3),
            other => Err(CoreError::UnsupportedHash(other)),
        }
    }

    /// Digest the given bytes.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha2_256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Blake3 => blake3::hash(data).as_bytes().to_vec(),
        }
    }
}

/// A self-describing digest.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Multihash {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
}

impl Multihash {
    /// Hash data with the given algorithm.
    pub fn hash(algorithm: HashAlgorithm, data: &[u8]) -> Self {
        Self {
            algorithm,
            digest: algorithm.digest(data),
        }
    }

    /// Wrap an existing digest.
    pub fn wrap(algorithm: HashAlgorithm, digest: Vec<u8>) -> Self {
        Self { algorithm, digest }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }
}

impl fmt::Debug for Multihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.algorithm, hex::encode(&self.digest))
    }
}

/// A content identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cid {
    version: Version,
    codec: Codec,
    multihash: Multihash,
}

impl Cid {
    pub fn new(version: Version, codec: Codec, multihash: Multihash) -> Self {
        Self {
            version,
            codec,
            multihash,
        }
    }

    /// Canonicalize, encode, digest and wrap a value as a version 1 CID.
    pub fn compute(value: &Value, codec: Codec, algorithm: HashAlgorithm) -> Result<Self> {
        let bytes = codec.encode(value)?;
        Ok(Self::for_bytes(&bytes, codec, algorithm))
    }

    /// CID of bytes that are already encoded with `codec`.
    pub fn for_bytes(bytes: &[u8], codec: Codec, algorithm: HashAlgorithm) -> Self {
        Self::new(Version::V1, codec, Multihash::hash(algorithm, bytes))
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn multihash(&self) -> &Multihash {
        &self.multihash
    }

    /// Bare digest in lowercase hex, the ledger-style address.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.multihash.digest)
    }

    /// Rebuild a version 1 CID from a hex digest. The codec and algorithm are
    /// not part of the text, so the caller supplies them.
    pub fn from_hex(s: &str, codec: Codec, algorithm: HashAlgorithm) -> Result<Self> {
        let digest =
            hex::decode(s).map_err(|e| CoreError::InvalidAddress(format!("{}: {}", s, e)))?;
        if digest.len() != 32 {
            return Err(CoreError::InvalidAddress(format!(
                "{}: expected a 32-byte digest, got {} bytes",
                s,
                digest.len()
            )));
        }
        Ok(Self::new(
            Version::V1,
            codec,
            Multihash::wrap(algorithm, digest),
        ))
    }

    /// Multibase string form, the block-store-style address.
    pub fn to_multibase(&self) -> Result<String> {
        let mh = ::multihash::Multihash::<64>::wrap(
            self.multihash.algorithm.code(),
            &self.multihash.digest,
        )
        .map_err(|e| CoreError::Encode(e.to_string()))?;
        let raw = match self.version {
            Version::V0 => ::cid::Cid::new_v0(mh).map_err(|e| CoreError::Encode(e.to_string()))?,
            Version::V1 => ::cid::Cid::new_v1(self.codec.code(), mh),
        };
        Ok(raw.to_string())
    }

    /// Parse a multibase CID string.
    pub fn from_multibase(s: &str) -> Result<Self> {
        let raw = ::cid::Cid::try_from(s)
            .map_err(|e| CoreError::InvalidAddress(format!("{}: {}", s, e)))?;
        let version = match raw.version() {
            ::cid::Version::V0 => Version::V0,
            ::cid::Version::V1 => Version::V1,
        };
        let codec = Codec::from_code(raw.codec())
            .ok_or_else(|| CoreError::UnknownCodec(format!("{:#x}", raw.codec())))?;
        let algorithm = HashAlgorithm::from_code(raw.hash().code())?;
        Ok(Self::new(
            version,
            codec,
            Multihash::wrap(algorithm, raw.hash().digest().to_vec()),
        ))
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(
            f,
            "Cid({:?}, {}, {:?}, {})",
            self.version,
            self.codec,
            self.multihash.algorithm,
            &hex[..hex.len().min(16)]
        )
    }
}

/// Split a flat `identifier[/remainder]` address.
pub fn split_address(address: &str) -> (&str, String) {
    match address.split_once('/') {
        Some((id, rest)) => (id, normalize_path(rest)),
        None => (address, String::new()),
    }
}

/// The default identifier scheme: dag-cbor, sha2-256, multibase text.
///
/// Used for self-certifying ids of metadata and claims.
pub fn identify(value: &Value) -> Result<String> {
    Cid::compute(value, Codec::DagCbor, HashAlgorithm::Sha2_256)?.to_multibase()
}

//! Signature primitives.
//!
//! Wraps Ed25519 (`EdDsa`) and ECDSA over secp256k1 (`ES256`) behind one set
//! of types. An issuer's identity string is its base58-encoded public key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Signature algorithms accepted in claim headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "EdDsa")]
    EdDsa,
    #[serde(rename = "ES256")]
    Es256,
}

impl Algorithm {
    pub const fn as_str(self) -> &'static str {
        match self {
            Algorithm::EdDsa => "EdDsa",
            Algorithm::Es256 => "ES256",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "EdDsa" => Ok(Algorithm::EdDsa),
            "ES256" => Ok(Algorithm::Es256),
            other => Err(CoreError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// A public key. Ed25519 keys are 32 bytes, secp256k1 keys are 33-byte
/// compressed SEC1 points.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum PublicKey {
    Ed25519([u8; 32]),
    Secp256k1([u8; 33]),
}

impl PublicKey {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            PublicKey::Ed25519(_) => Algorithm::EdDsa,
            PublicKey::Secp256k1(_) => Algorithm::Es256,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            PublicKey::Ed25519(bytes) => bytes,
            PublicKey::Secp256k1(bytes) => bytes,
        }
    }

    /// The identity string for this key.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.as_bytes()).into_string()
    }

    /// Parse an identity string. The key type follows from the decoded length.
    pub fn from_base58(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| CoreError::InvalidPublicKey)?;
        match bytes.len() {
            32 => {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(&bytes);
                Ok(PublicKey::Ed25519(arr))
            }
            33 => {
                let mut arr = [0u8; 33];
                arr.copy_from_slice(&bytes);
                Ok(PublicKey::Secp256k1(arr))
            }
            _ => Err(CoreError::InvalidPublicKey),
        }
    }

    /// Verify a signature over a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        match self {
            PublicKey::Ed25519(bytes) => {
                let key = ed25519_dalek::VerifyingKey::from_bytes(bytes)
                    .map_err(|_| CoreError::InvalidPublicKey)?;
                let sig = ed25519_dalek::Signature::from_slice(&signature.0)
                    .map_err(|_| CoreError::InvalidSignature)?;
                ed25519_dalek::Verifier::verify(&key, message, &sig)
                    .map_err(|_| CoreError::InvalidSignature)
            }
            PublicKey::Secp256k1(bytes) => {
                let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
                    .map_err(|_| CoreError::InvalidPublicKey)?;
                let sig = k256::ecdsa::Signature::from_slice(&signature.0)
                    .map_err(|_| CoreError::InvalidSignature)?;
                k256::ecdsa::signature::Verifier::verify(&key, message, &sig)
                    .map_err(|_| CoreError::InvalidSignature)
            }
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}, {})", self.algorithm(), self.to_base58())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

/// Raw signature bytes (64 bytes for both supported algorithms).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_base58(s: &str) -> Result<Self> {
        bs58::decode(s)
            .into_vec()
            .map(Self)
            .map_err(|_| CoreError::InvalidSignature)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(&self.0);
        write!(f, "Signature({}...)", &hex[..hex.len().min(16)])
    }
}

/// A signing keypair.
#[derive(Clone)]
pub enum Keypair {
    Ed25519(ed25519_dalek::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate(algorithm: Algorithm) -> Self {
        let mut rng = rand::thread_rng();
        match algorithm {
            Algorithm::EdDsa => Keypair::Ed25519(ed25519_dalek::SigningKey::generate(&mut rng)),
            Algorithm::Es256 => Keypair::Secp256k1(k256::ecdsa::SigningKey::random(&mut rng)),
        }
    }

    /// Create from a 32-byte seed.
    ///
    /// Fails for secp256k1 when the seed is not a valid scalar.
    pub fn from_seed(algorithm: Algorithm, seed: &[u8; 32]) -> Result<Self> {
        match algorithm {
            Algorithm::EdDsa => Ok(Keypair::Ed25519(ed25519_dalek::SigningKey::from_bytes(seed))),
            Algorithm::Es256 => k256::ecdsa::SigningKey::from_slice(seed)
                .map(Keypair::Secp256k1)
                .map_err(|_| CoreError::InvalidSeed),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Keypair::Ed25519(_) => Algorithm::EdDsa,
            Keypair::Secp256k1(_) => Algorithm::Es256,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            Keypair::Ed25519(key) => PublicKey::Ed25519(key.verifying_key().to_bytes()),
            Keypair::Secp256k1(key) => {
                let point = key.verifying_key().to_encoded_point(true);
                let mut arr = [0u8; 33];
                arr.copy_from_slice(point.as_bytes());
                PublicKey::Secp256k1(arr)
            }
        }
    }

    /// The identity string of this keypair's public key.
    pub fn identity(&self) -> String {
        self.public_key().to_base58()
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        match self {
            Keypair::Ed25519(key) => {
                let sig = ed25519_dalek::Signer::sign(key, message);
                Signature(sig.to_bytes().to_vec())
            }
            Keypair::Secp256k1(key) => {
                let sig: k256::ecdsa::Signature =
                    k256::ecdsa::signature::Signer::sign(key, message);
                Signature(sig.to_bytes().to_vec())
            }
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}

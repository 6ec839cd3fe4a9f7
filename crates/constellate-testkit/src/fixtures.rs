//! Test fixtures and helpers.
//!
//! Common setup code for unit and integration tests.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use constellate_claims::{Metadata, MetadataKind};
use constellate_core::{
    canonicalize, split_address, Algorithm, Cid, Codec, HashAlgorithm, Keypair, Value,
};
use constellate_store::{Backend, Result, StoreError};

/// A named participant with a deterministic keypair.
#[derive(Debug, Clone)]
pub struct Party {
    pub name: String,
    pub keypair: Keypair,
}

impl Party {
    /// Create a party whose key is derived from its name.
    pub fn new(name: impl Into<String>, algorithm: Algorithm) -> Self {
        let name = name.into();
        let seed = *blake3::hash(name.as_bytes()).as_bytes();
        Self::with_seed(name, algorithm, seed)
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(name: impl Into<String>, algorithm: Algorithm, seed: [u8; 32]) -> Self {
        Self {
            name: name.into(),
            keypair: Keypair::from_seed(algorithm, &seed).expect("seed is a valid scalar"),
        }
    }

    /// The party's identity string.
    pub fn identity(&self) -> String {
        self.keypair.identity()
    }
}

/// Create several parties for multi-party tests, named `party-0`, `party-1`, ...
pub fn parties(count: usize, algorithm: Algorithm) -> Vec<Party> {
    (0..count)
        .map(|i| Party::new(format!("party-{}", i), algorithm))
        .collect()
}

fn identities(parties: &[&Party]) -> Value {
    parties.iter().map(|p| p.identity()).collect()
}

/// A composition listing `composers` as its composers.
pub fn composition(title: &str, composers: &[&Party]) -> Metadata {
    Metadata::of_kind(MetadataKind::MusicComposition)
        .with("title", title)
        .with("composer", identities(composers))
}

/// A recording of `recording_of` (a link or an id) performed by `performers`.
pub fn recording(recording_of: impl Into<Value>, performers: &[&Party]) -> Metadata {
    Metadata::of_kind(MetadataKind::MusicRecording)
        .with("recordingOf", recording_of)
        .with("performer", identities(performers))
}

#[derive(Clone)]
struct Entry {
    name: String,
    value: Value,
    delay: Option<Duration>,
}

/// A backend whose documents live under chosen names instead of content
/// hashes.
///
/// The CID for a name is the sha2-256 of the name itself, so documents can
/// link to each other in ways content addressing forbids, such as cycles.
/// Blocks are never hash-checked. Reads can be delayed per document, and
/// the order in which reads finish is recorded.
#[derive(Default)]
pub struct ScriptedBackend {
    entries: RwLock<HashMap<Cid, Entry>>,
    completed: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The CID a name is stored under.
    pub fn cid(&self, name: &str) -> Cid {
        Cid::for_bytes(name.as_bytes(), Codec::DagCbor, HashAlgorithm::Sha2_256)
    }

    /// The link address of a name.
    pub fn address(&self, name: &str) -> String {
        self.cid(name).to_multibase().expect("sha2-256 CIDs always encode")
    }

    /// Store a document under a name.
    pub fn insert(&self, name: &str, value: Value) {
        self.store(self.cid(name), name, value, None);
    }

    /// Store a document under a name; reads of it take `delay`.
    pub fn insert_delayed(&self, name: &str, value: Value, delay: Duration) {
        self.store(self.cid(name), name, value, Some(delay));
    }

    /// Names in the order their reads completed.
    pub fn completion_order(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    fn store(&self, cid: Cid, name: &str, value: Value, delay: Option<Duration>) {
        let entry = Entry {
            name: name.to_string(),
            value: canonicalize(&value),
            delay,
        };
        self.entries.write().unwrap().insert(cid, entry);
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn codec(&self) -> Codec {
        Codec::DagCbor
    }

    async fn put(&self, value: &Value) -> Result<Cid> {
        let cid = self.compute_cid(value)?;
        let name = self.cid_to_address(&cid)?;
        self.store(cid.clone(), &name, value.clone(), None);
        Ok(cid)
    }

    async fn get(&self, cid: &Cid) -> Result<Value> {
        self.check_cid(cid)?;

        let entry = self.entries.read().unwrap().get(cid).cloned();
        let entry = match entry {
            Some(entry) => entry,
            None => return Err(StoreError::NotFound(self.cid_to_address(cid)?)),
        };

        if let Some(delay) = entry.delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.lock().unwrap().push(entry.name);
        Ok(entry.value)
    }

    fn address_to_cid(&self, address: &str) -> Result<(Cid, String)> {
        let (id, remainder) = split_address(address);
        Ok((Cid::from_multibase(id)?, remainder))
    }

    fn cid_to_address(&self, cid: &Cid) -> Result<String> {
        Ok(cid.to_multibase()?)
    }
}

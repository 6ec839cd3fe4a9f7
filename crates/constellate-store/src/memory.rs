//! In-memory block store.
//!
//! Behaves like an IPFS-style block store: documents are kept as dag-cbor
//! blocks keyed by CID and addressed with multibase CID strings. Nothing is
//! persisted; all data is lost when the backend is dropped.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use constellate_core::{split_address, Cid, Codec, Value};

use crate::error::{Result, StoreError};
use crate::traits::{verify_block, Backend};

/// In-memory block store. Thread-safe via RwLock.
pub struct MemoryBackend {
    blocks: RwLock<HashMap<Cid, Bytes>>,
}

impl MemoryBackend {
    /// Create a new empty block store.
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(HashMap::new()),
        }
    }

    /// Store raw block bytes under a CID without re-encoding them.
    ///
    /// The bytes are checked against the CID on the next `get`, not here.
    pub fn put_block(&self, cid: Cid, block: impl Into<Bytes>) {
        self.blocks.write().unwrap().insert(cid, block.into());
    }

    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.blocks.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn codec(&self) -> Codec {
        Codec::DagCbor
    }

    async fn put(&self, value: &Value) -> Result<Cid> {
        let block = self.codec().encode(value)?;
        let cid = Cid::for_bytes(&block, self.codec(), self.hash_algorithm());

        let mut blocks = self.blocks.write().unwrap();
        blocks.entry(cid.clone()).or_insert_with(|| Bytes::from(block));
        tracing::debug!(cid = ?cid, "stored block");

        Ok(cid)
    }

    async fn get(&self, cid: &Cid) -> Result<Value> {
        self.check_cid(cid)?;

        let block = self.blocks.read().unwrap().get(cid).cloned();
        let block = match block {
            Some(block) => block,
            None => return Err(StoreError::NotFound(self.cid_to_address(cid)?)),
        };

        verify_block(cid, &block)?;
        tracing::trace!(cid = ?cid, bytes = block.len(), "loaded block");
        Ok(self.codec().decode(&block)?)
    }

    fn address_to_cid(&self, address: &str) -> Result<(Cid, String)> {
        let (id, remainder) = split_address(address);
        Ok((Cid::from_multibase(id)?, remainder))
    }

    fn cid_to_address(&self, cid: &Cid) -> Result<String> {
        Ok(cid.to_multibase()?)
    }
}

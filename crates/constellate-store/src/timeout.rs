//! Per-call timeout wrapper for any backend.

use std::time::Duration;

use async_trait::async_trait;
use constellate_core::{Cid, Codec, HashAlgorithm, Resolved, Value, Version};

use crate::error::{Result, StoreError};
use crate::traits::Backend;

/// Wraps `put` and `get` of an inner backend in a deadline.
///
/// Pure operations (hashing, addressing, path walking) are forwarded as-is.
pub struct TimeoutBackend<B> {
    inner: B,
    timeout: Duration,
}

impl<B: Backend> TimeoutBackend<B> {
    pub fn new(inner: B, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<B: Backend> Backend for TimeoutBackend<B> {
    fn codec(&self) -> Codec {
        self.inner.codec()
    }

    fn hash_algorithm(&self) -> HashAlgorithm {
        self.inner.hash_algorithm()
    }

    fn version(&self) -> Version {
        self.inner.version()
    }

    async fn put(&self, value: &Value) -> Result<Cid> {
        tokio::time::timeout(self.timeout, self.inner.put(value))
            .await
            .map_err(|_| {
                tracing::warn!(timeout = ?self.timeout, "backend put timed out");
                StoreError::Timeout(self.timeout)
            })?
    }

    async fn get(&self, cid: &Cid) -> Result<Value> {
        tokio::time::timeout(self.timeout, self.inner.get(cid))
            .await
            .map_err(|_| {
                tracing::warn!(cid = ?cid, timeout = ?self.timeout, "backend get timed out");
                StoreError::Timeout(self.timeout)
            })?
    }

    fn address_to_cid(&self, address: &str) -> Result<(Cid, String)> {
        self.inner.address_to_cid(address)
    }

    fn cid_to_address(&self, cid: &Cid) -> Result<String> {
        self.inner.cid_to_address(cid)
    }

    fn compute_cid(&self, value: &Value) -> Result<Cid> {
        self.inner.compute_cid(value)
    }

    fn hash(&self, value: &Value) -> Result<String> {
        self.inner.hash(value)
    }

    fn resolve(&self, value: &Value, path: &str) -> Result<Resolved> {
        self.inner.resolve(value, path)
    }

    fn check_cid(&self, cid: &Cid) -> Result<()> {
        self.inner.check_cid(cid)
    }
}

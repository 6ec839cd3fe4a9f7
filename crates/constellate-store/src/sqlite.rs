//! SQLite ledger backend.
//!
//! Behaves like a transaction ledger: documents are stored as canonical
//! dag-json and addressed by the bare hex digest of their body. Uses
//! rusqlite with bundled SQLite, wrapped in async via `spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use constellate_core::{now_millis, split_address, Cid, Codec, HashAlgorithm, Value};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{verify_block, Backend};

const LEDGER_CODEC: Codec = Codec::DagJson;
const LEDGER_HASH: HashAlgorithm = HashAlgorithm::Sha2_256;

/// SQLite-backed ledger.
///
/// Thread-safe via internal Mutex. All queries run on the blocking pool.
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and its schema if it doesn't exist. An existing file
    /// written with another codec or digest algorithm is refused with
    /// [`StoreError::IncompatibleLedger`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(mut conn: Connection) -> Result<Self> {
        migration::prepare(&mut conn, LEDGER_CODEC, LEDGER_HASH)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Number of stored documents.
    pub async fn count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
            Ok(n as u64)
        })
        .await
    }

    /// Run a closure against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&conn)
        })
        .await
        .map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("spawn_blocking failed: {}", e)),
            ))
        })?
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    fn codec(&self) -> Codec {
        LEDGER_CODEC
    }

    fn hash_algorithm(&self) -> HashAlgorithm {
        LEDGER_HASH
    }

    async fn put(&self, value: &Value) -> Result<Cid> {
        let body = self.codec().encode(value)?;
        let cid = Cid::for_bytes(&body, self.codec(), self.hash_algorithm());
        let address = cid.to_hex();
        let codec = self.codec().name();

        let inserted = self
            .blocking(move |conn| {
                let n = conn.execute(
                    "INSERT OR IGNORE INTO documents (address, codec, body, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![address, codec, body, now_millis()],
                )?;
                Ok(n > 0)
            })
            .await?;

        tracing::debug!(cid = ?cid, inserted, "stored document");
        Ok(cid)
    }

    async fn get(&self, cid: &Cid) -> Result<Value> {
        self.check_cid(cid)?;
        let address = cid.to_hex();

        let lookup = address.clone();
        let row: Option<(String, Vec<u8>)> = self
            .blocking(move |conn| {
                conn.query_row(
                    "SELECT codec, body FROM documents WHERE address = ?1",
                    params![lookup],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(StoreError::from)
            })
            .await?;

        let (codec, body) = row.ok_or(StoreError::NotFound(address))?;
        let stored: Codec = codec
            .parse()
            .map_err(|_| StoreError::Serialization(format!("unknown stored codec {}", codec)))?;
        if stored != self.codec() {
            return Err(StoreError::UnexpectedCodec {
                expected: self.codec(),
                actual: stored,
            });
        }

        verify_block(cid, &body)?;
        Ok(self.codec().decode(&body)?)
    }

    fn address_to_cid(&self, address: &str) -> Result<(Cid, String)> {
        let (id, remainder) = split_address(address);
        let cid = Cid::from_hex(id, self.codec(), self.hash_algorithm())?;
        Ok((cid, remainder))
    }

    fn cid_to_address(&self, cid: &Cid) -> Result<String> {
        Ok(cid.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constellate_core::{document, Link};

    fn sample() -> Value {
        Value::Map(document([
            ("@type", Value::from("Person")),
            ("name", Value::from("amy")),
            ("tags", Value::from_iter(["b", "a"])),
        ]))
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let backend = SqliteBackend::open_memory().unwrap();
        let cid = backend.put(&sample()).await.unwrap();
        assert_eq!(cid.codec(), Codec::DagJson);

        let loaded = backend.get(&cid).await.unwrap();
        assert_eq!(loaded, constellate_core::canonicalize(&sample()));
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let backend = SqliteBackend::open_memory().unwrap();
        let c1 = backend.put(&sample()).await.unwrap();
        let c2 = backend.put(&sample()).await.unwrap();
        assert_eq!(c1, c2);
        assert_eq!(backend.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_hex_addresses() {
        let backend = SqliteBackend::open_memory().unwrap();
        let id = backend.hash(&sample()).unwrap();
        assert_eq!(id.len(), 64);
        assert_eq!(backend.count().await.unwrap(), 0);

        let cid = backend.put(&sample()).await.unwrap();
        let (parsed, remainder) = backend.address_to_cid(&format!("{}/tags/1", id)).unwrap();
        assert_eq!(parsed, cid);
        assert_eq!(remainder, "tags/1");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let backend = SqliteBackend::open_memory().unwrap();
        let cid = backend.compute_cid(&sample()).unwrap();
        assert!(matches!(
            backend.get(&cid).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_get_rejects_foreign_codec() {
        let backend = SqliteBackend::open_memory().unwrap();
        let cid = Cid::compute(&sample(), Codec::DagCbor, HashAlgorithm::Sha2_256).unwrap();
        assert!(matches!(
            backend.get(&cid).await.unwrap_err(),
            StoreError::UnexpectedCodec { .. }
        ));
    }

    #[tokio::test]
    async fn test_tampered_row_detected() {
        let backend = SqliteBackend::open_memory().unwrap();
        let cid = backend.put(&sample()).await.unwrap();

        let address = cid.to_hex();
        backend
            .blocking(move |conn| {
                conn.execute(
                    "UPDATE documents SET body = ?1 WHERE address = ?2",
                    params![b"{\"name\":\"mallory\"}".to_vec(), address],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        assert!(matches!(
            backend.get(&cid).await.unwrap_err(),
            StoreError::UnexpectedHash { .. }
        ));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        let link = Link::with_path("00ff", "name");
        let doc = Value::Map(document([("ref", Value::Link(link.clone()))]));

        let cid = {
            let backend = SqliteBackend::open(&path).unwrap();
            backend.put(&doc).await.unwrap()
        };

        let backend = SqliteBackend::open(&path).unwrap();
        let loaded = backend.get(&cid).await.unwrap();
        assert_eq!(loaded.get("ref").and_then(Value::as_link), Some(&link));
    }

    #[test]
    fn test_refuses_ledger_with_other_codec() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        drop(SqliteBackend::open(&path).unwrap());

        let conn = Connection::open(&path).unwrap();
        conn.execute("UPDATE ledger SET value = 'dag-cbor' WHERE setting = 'codec'", [])
            .unwrap();
        drop(conn);

        let err = SqliteBackend::open(&path).err().unwrap();
        assert!(matches!(
            err,
            StoreError::IncompatibleLedger { setting: "codec", .. }
        ));
    }
}

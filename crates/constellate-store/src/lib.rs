//! # Constellate Store
//!
//! The Backend contract and two backends that satisfy it.
//!
//! ## Overview
//!
//! The resolver and the claims engine never talk to storage directly; they
//! go through the [`Backend`] trait. Backends differ in the codec they store
//! and in how a CID is written as text:
//!
//! | backend            | style       | codec    | address form      |
//! |--------------------|-------------|----------|-------------------|
//! | [`MemoryBackend`]  | block store | dag-cbor | multibase CID     |
//! | [`SqliteBackend`]  | ledger      | dag-json | hex sha2-256 digest |
//!
//! [`TimeoutBackend`] wraps either one with a per-call deadline.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use constellate_core::{document, Value};
//! use constellate_store::{Backend, SqliteBackend};
//!
//! async fn example() -> constellate_store::Result<()> {
//!     let backend = SqliteBackend::open("ledger.db")?;
//!     let doc = Value::Map(document([("name", Value::from("amy"))]));
//!     let cid = backend.put(&doc).await?;
//!     let loaded = backend.get(&cid).await?;
//!     assert_eq!(loaded, doc);
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent puts**: storing the same document twice returns the same CID
//! - **Integrity**: every `get` re-hashes the stored bytes
//! - **Strict identifiers**: foreign codecs and versions are rejected up front

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod timeout;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use timeout::TimeoutBackend;
pub use traits::Backend;

//! Schema setup for the SQLite ledger.
//!
//! The schema version lives in SQLite's `user_version` pragma. A `ledger`
//! table pins the codec and digest algorithm the file was created with, so
//! a file written under one addressing scheme is never read under another.

use rusqlite::{params, Connection, OptionalExtension};

use constellate_core::{Codec, HashAlgorithm};

use crate::error::{Result, StoreError};

/// Schema version written to `user_version`.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA: &str = r#"
    CREATE TABLE documents (
        address TEXT PRIMARY KEY,         -- hex digest of body
        codec TEXT NOT NULL,              -- multicodec name, e.g. dag-json
        body BLOB NOT NULL,               -- canonical encoding
        created_at INTEGER NOT NULL       -- local time of first insert (Unix ms)
    );

    CREATE INDEX idx_documents_created ON documents(created_at);

    CREATE TABLE ledger (
        setting TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
"#;

/// Create the schema on a fresh database, or check an existing one.
///
/// An existing ledger must carry [`SCHEMA_VERSION`] and must have been
/// written with `codec` and `hash`.
pub fn prepare(conn: &mut Connection, codec: Codec, hash: HashAlgorithm) -> Result<()> {
    let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    match version {
        0 => create(conn, codec, hash),
        SCHEMA_VERSION => {
            expect_setting(conn, "codec", codec.name())?;
            expect_setting(conn, "hash", &hash.code().to_string())
        }
        other => Err(StoreError::Migration(format!(
            "ledger schema version {} is not supported (expected {})",
            other, SCHEMA_VERSION
        ))),
    }
}

fn create(conn: &mut Connection, codec: Codec, hash: HashAlgorithm) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA)?;
    tx.execute(
        "INSERT INTO ledger (setting, value) VALUES ('codec', ?1), ('hash', ?2)",
        params![codec.name(), hash.code().to_string()],
    )?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;

    tracing::debug!(version = SCHEMA_VERSION, %codec, ?hash, "created ledger schema");
    Ok(())
}

fn expect_setting(conn: &Connection, setting: &'static str, expected: &str) -> Result<()> {
    let found: Option<String> = conn
        .query_row(
            "SELECT value FROM ledger WHERE setting = ?1",
            params![setting],
            |row| row.get(0),
        )
        .optional()?;

    match found {
        Some(found) if found == expected => Ok(()),
        found => Err(StoreError::IncompatibleLedger {
            setting,
            expected: expected.to_string(),
            found: found.unwrap_or_else(|| "nothing".to_string()),
        }),
    }
}

//! SQLite-backed key-value backend.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use super::{KvBackend, StoreResult};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS kv (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);";

/// [`KvBackend`] over a single-table SQLite database.
pub struct SqliteKv {
    conn: Connection,
}

impl SqliteKv {
    /// Opens or creates the database at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::init_connection(Connection::open(path)?)
    }

    /// Opens an in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init_connection(Connection::open_in_memory()?)
    }

    fn init_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }
}

impl KvBackend for SqliteKv {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO kv(key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

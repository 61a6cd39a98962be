//! SQLite change cache

use crate::cache::traits::{CacheResult, ChangeCache};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS change_cache (
    title TEXT PRIMARY KEY,
    price REAL NOT NULL
);
"#;

/// Change cache kept in a local SQLite file
pub struct SqliteChangeCache {
    conn: Connection,
}

impl SqliteChangeCache {
    pub fn new(path: &Path) -> CacheResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }
}

impl ChangeCache for SqliteChangeCache {
    fn get(&mut self, title: &str) -> CacheResult<Option<f64>> {
        let price = self
            .conn
            .query_row(
                "SELECT price FROM change_cache WHERE title = ?1",
                params![title],
                |row| row.get(0),
            )
            .optional()?;
        Ok(price)
    }

    fn set(&mut self, title: &str, price: f64) -> CacheResult<()> {
        self.conn.execute(
            "INSERT INTO change_cache (title, price) VALUES (?1, ?2)
             ON CONFLICT(title) DO UPDATE SET price = excluded.price",
            params![title, price],
        )?;
        Ok(())
    }
}

//! SQLite schema for the catalog store

/// SQL schema for the catalog database
pub const SCHEMA_SQL: &str = r#"
-- One row per product; position keeps the catalog's insertion order
CREATE TABLE IF NOT EXISTS products (
    position INTEGER PRIMARY KEY,
    title TEXT NOT NULL UNIQUE,
    price REAL NOT NULL,
    image_path TEXT NOT NULL DEFAULT ''
);
"#;

/// Initializes the catalog schema on a connection
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}

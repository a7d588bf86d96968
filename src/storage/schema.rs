//! Database schema definitions
//!
//! The SQLite backend is a key-value table: each key holds one whole JSON
//! document.

use rusqlite::Connection;

/// Key of the catalog snapshot document
pub const SNAPSHOT_KEY: &str = "catalog-snapshot";

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    key TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// Creates the schema if it does not exist yet
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

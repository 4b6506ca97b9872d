//! Schema bootstrap and SQL text for the cache table.
//!
//! The table name is the only piece of the schema that varies between
//! deployments, and SQL identifiers cannot be bound as parameters, so every
//! statement here interpolates a [`TableName`] that was validated against an
//! identifier allow-list at construction. The catalog existence check binds
//! the name as an ordinary parameter with case-insensitive collation, which
//! matches SQLite's own identifier normalization.

use rusqlite::{params, Connection, OptionalExtension};

use crate::config::TableName;

// =============================================================================
// SQL Text
// =============================================================================

/// DDL creating the cache table with its composite primary key.
pub(crate) fn create_table_sql(table: &TableName) -> String {
    format!(
        "CREATE TABLE {table} (\n\
         \x20   Type INTEGER NOT NULL,\n\
         \x20   Zoom INTEGER NOT NULL,\n\
         \x20   X    INTEGER NOT NULL,\n\
         \x20   Y    INTEGER NOT NULL,\n\
         \x20   Tile BLOB    NOT NULL,\n\
         \x20   PRIMARY KEY (Type, Zoom, X, Y)\n\
         )"
    )
}

/// Parameterized single-row fetch of the tile blob.
///
/// Parameter order is `(x, y, zoom, type)`.
pub(crate) fn fetch_sql(table: &TableName) -> String {
    format!("SELECT Tile FROM {table} WHERE X = ?1 AND Y = ?2 AND Zoom = ?3 AND Type = ?4")
}

/// Parameterized insert of one tile row.
///
/// Parameter order is `(x, y, zoom, type, tile)`.
pub(crate) fn insert_sql(table: &TableName) -> String {
    format!("INSERT INTO {table} (X, Y, Zoom, Type, Tile) VALUES (?1, ?2, ?3, ?4, ?5)")
}

// =============================================================================
// Bootstrap
// =============================================================================

/// Check whether the cache table exists, case-insensitively.
pub(crate) fn table_exists(conn: &Connection, table: &TableName) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            params![table.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Create the cache table if it does not already exist.
pub(crate) fn ensure_table(conn: &Connection, table: &TableName) -> rusqlite::Result<()> {
    if !table_exists(conn, table)? {
        conn.execute_batch(&create_table_sql(table))?;
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

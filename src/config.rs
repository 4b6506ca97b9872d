//! Configuration management for the tile store.
//!
//! This module provides:
//! - [`StoreConfig`], the library-facing configuration (connection string,
//!   table name, busy timeout)
//! - [`TableName`], a validated SQL identifier for the cache table
//! - Command-line argument types for the `tile-store` binary via clap,
//!   with environment-variable fallbacks under the `TILE_STORE_` prefix
//!
//! # Example
//!
//! ```
//! use tile_store::config::StoreConfig;
//!
//! let config = StoreConfig::new("/tmp/tiles.db");
//! assert_eq!(config.table_name.as_str(), "tile_cache");
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Environment Variables
//!
//! - `TILE_STORE_DB` - SQLite database path or `file:` URI
//! - `TILE_STORE_TABLE` - Cache table name (default: tile_cache)
//! - `TILE_STORE_BUSY_TIMEOUT_MS` - Busy timeout in milliseconds (default: 5000)

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::error::StoreError;

// =============================================================================
// Default Values
// =============================================================================

/// Default name of the backing cache table.
pub const DEFAULT_TABLE_NAME: &str = "tile_cache";

/// Default busy timeout applied to each connection, in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Maximum accepted length of a table identifier, in bytes.
pub const MAX_TABLE_NAME_LEN: usize = 64;

// =============================================================================
// Table Name
// =============================================================================

/// A validated SQL identifier naming the backing cache table.
///
/// Table names cannot be bound as query parameters, so they are interpolated
/// into DDL and statement text. To keep that interpolation safe the name is
/// restricted to an allow-list at construction: an ASCII letter or underscore
/// followed by ASCII letters, digits, or underscores, at most
/// [`MAX_TABLE_NAME_LEN`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Validate and wrap a table identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTableName`] if the identifier is empty,
    /// too long, or contains characters outside the allow-list.
    pub fn new(name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        if Self::is_valid(&name) {
            Ok(Self(name))
        } else {
            Err(StoreError::InvalidTableName {
                name,
                max_len: MAX_TABLE_NAME_LEN,
            })
        }
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(name: &str) -> bool {
        if name.is_empty() || name.len() > MAX_TABLE_NAME_LEN {
            return false;
        }
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(DEFAULT_TABLE_NAME.to_string())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Store Configuration
// =============================================================================

/// Configuration for a [`TileStore`](crate::TileStore).
///
/// The connection string is the only mutable piece of store state at runtime
/// (via [`TileStore::set_connection_string`](crate::TileStore::set_connection_string));
/// the table name and busy timeout are fixed at construction.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite database path or `file:` URI.
    pub connection_string: String,

    /// Name of the backing cache table.
    pub table_name: TableName,

    /// Busy timeout applied to each connection.
    ///
    /// This is the backing store's native query-timeout mechanism: a
    /// statement that cannot acquire its lock within the timeout fails, and
    /// the failure follows the normal close-and-degrade path.
    pub busy_timeout: Duration,
}

impl StoreConfig {
    /// Create a configuration with the default table name and busy timeout.
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            table_name: TableName::default(),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    /// Set the cache table name.
    pub fn with_table_name(mut self, table_name: TableName) -> Self {
        self.table_name = table_name;
        self
    }

    /// Set the busy timeout.
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConnectionString`] if the connection
    /// string is empty or blank. The table name was already validated at
    /// [`TableName`] construction.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.connection_string.trim().is_empty() {
            return Err(StoreError::InvalidConnectionString(
                "connection string must not be empty",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tile Store - a persistent SQLite-backed cache for map image tiles.
///
/// Tiles are keyed by (type, zoom, x, y) and stored as opaque blobs in a
/// single relational table that is created on first use.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-store")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands of the `tile-store` binary.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Initialize the store and report whether the backing table is reachable.
    Check(CheckArgs),

    /// Cache a tile image from a local file.
    Put(PutArgs),

    /// Fetch a cached tile's raw bytes to a local file.
    Get(GetArgs),
}

/// Arguments shared by every subcommand: where the store lives.
#[derive(Parser, Debug, Clone)]
pub struct StoreArgs {
    /// SQLite database path or file: URI.
    #[arg(long = "db", env = "TILE_STORE_DB")]
    pub connection_string: String,

    /// Name of the cache table.
    #[arg(long, default_value = DEFAULT_TABLE_NAME, env = "TILE_STORE_TABLE")]
    pub table: String,

    /// Busy timeout in milliseconds.
    #[arg(long, default_value_t = DEFAULT_BUSY_TIMEOUT_MS, env = "TILE_STORE_BUSY_TIMEOUT_MS")]
    pub busy_timeout_ms: u64,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl StoreArgs {
    /// Build a [`StoreConfig`] from the parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the table name or connection string
    /// is invalid.
    pub fn to_config(&self) -> Result<StoreConfig, StoreError> {
        let table_name = TableName::new(self.table.clone())?;
        let config = StoreConfig::new(self.connection_string.clone())
            .with_table_name(table_name)
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms));
        config.validate()?;
        Ok(config)
    }
}

/// Arguments for the `check` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

/// Arguments for the `put` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct PutArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Tile provider/type identifier.
    #[arg(long = "type")]
    pub type_id: i32,

    /// Zoom level.
    #[arg(long)]
    pub zoom: i32,

    /// Tile X coordinate.
    #[arg(short = 'x', long)]
    pub x: i64,

    /// Tile Y coordinate.
    #[arg(short = 'y', long)]
    pub y: i64,

    /// Path to the tile image file to cache.
    pub file: PathBuf,
}

/// Arguments for the `get` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct GetArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Tile provider/type identifier.
    #[arg(long = "type")]
    pub type_id: i32,

    /// Zoom level.
    #[arg(long)]
    pub zoom: i32,

    /// Tile X coordinate.
    #[arg(short = 'x', long)]
    pub x: i64,

    /// Tile Y coordinate.
    #[arg(short = 'y', long)]
    pub y: i64,

    /// Path to write the tile bytes to.
    #[arg(short, long)]
    pub output: PathBuf,
}

// =============================================================================
// Tests
// =============================================================================

//! # Tile Store
//!
//! A persistent, SQLite-backed cache for rectangular map image tiles.
//!
//! Tiles are keyed by `(type, zoom, x, y)` and stored as opaque blobs in a
//! single relational table. The store sits behind a mapping control's
//! tile-cache capability: on a miss the caller falls back to its network
//! tile source and writes the fetched bytes back through the cache.
//!
//! ## Features
//!
//! - **Lazy, idempotent initialization**: connections open and the table is
//!   created on first use; repeat calls short-circuit
//! - **Self-healing**: any operational failure closes the store, and the
//!   next call re-initializes from scratch
//! - **Split read/write connections**: reader queries are never queued
//!   behind writer locks at the connection level
//! - **Degrade, don't fail**: backing-store errors become cache misses and
//!   failed writes, never faults on the caller's path
//! - **Pluggable decoding**: a [`TileDecoder`] turns stored bytes into the
//!   embedding application's image type
//!
//! ## Architecture
//!
//! The library is organized into a few modules:
//!
//! - [`store`] - the [`TileStore`] lifecycle, read path, and write path
//! - [`cache`] - the [`PersistentTileCache`] async capability trait
//! - [`decoder`] - decoding collaborators ([`RawTileDecoder`], [`ImageTileDecoder`])
//! - [`config`] - [`StoreConfig`], table-name validation, and CLI types
//! - [`error`] - the [`StoreError`] taxonomy
//!
//! ## Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use tile_store::{PersistentTileCache, RawTileDecoder, StoreConfig, TilePosition, TileStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = StoreConfig::new("/var/cache/tiles.db");
//!     let cache = TileStore::new(config, RawTileDecoder).unwrap();
//!
//!     let pos = TilePosition::new(100, 200);
//!     let fetched = Bytes::from_static(b"\x89PNG...");
//!
//!     if cache.get_tile(2, pos, 10).await.is_none() {
//!         // ... fetch from the network, then cache the result:
//!         cache.put_tile(fetched, 2, pos, 10).await;
//!     }
//! }
//! ```

pub mod cache;
pub mod config;
pub mod decoder;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use cache::PersistentTileCache;
pub use config::{StoreConfig, TableName, DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_TABLE_NAME};
pub use decoder::{ImageTileDecoder, RawTileDecoder, TileDecoder};
pub use error::StoreError;
pub use store::{TileKey, TilePosition, TileStore};

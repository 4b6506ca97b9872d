//! Persistent tile store.
//!
//! # Components
//!
//! - [`TileStore`]: the store itself — lifecycle, read path, write path
//! - [`TileKey`] / [`TilePosition`]: composite key identifying one tile
//! - `schema` (private): identifier-safe DDL and statement text
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  TileStore                   │
//! │  ┌─────────────┐        ┌─────────────────┐  │
//! │  │ read conn   │        │ write conn      │  │
//! │  │ (fetch stmt)│        │ (insert stmt)   │  │
//! │  └──────┬──────┘        └────────┬────────┘  │
//! └─────────┼────────────────────────┼───────────┘
//!           ▼                        ▼
//!       ┌──────────────────────────────────┐
//!       │   tile_cache (Type,Zoom,X,Y) PK  │
//!       └──────────────────────────────────┘
//! ```

mod key;
mod schema;
mod sqlite;

pub use key::{TileKey, TilePosition};
pub use sqlite::TileStore;

//! Async tile-cache capability.
//!
//! [`PersistentTileCache`] is the contract the embedding mapping system
//! programs against: a miss (or a failed write) tells the caller to fall back
//! to its own tile source, nothing more. [`TileStore`] implements it by
//! offloading its blocking database calls to the runtime's blocking thread
//! pool, so many tiles' worth of gets and puts can be in flight without one
//! call starving the others.

use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::task;

use crate::decoder::TileDecoder;
use crate::error::StoreError;
use crate::store::{TileKey, TilePosition, TileStore};

/// A persistent cache of map tiles, addressed by `(type, zoom, x, y)`.
///
/// All operations degrade rather than fail: operational problems in the
/// backing store surface as `None` / `false`, never as errors, because the
/// cache is an optimization layer in front of the caller's real tile source.
/// The one exception is [`delete_older_than`](Self::delete_older_than), whose
/// typed error distinguishes "unsupported" from "transient".
#[async_trait]
pub trait PersistentTileCache: Send + Sync {
    /// The decoded tile representation handed back on a hit.
    type Image: Send + 'static;

    /// Ensure the cache is ready. Idempotent; `false` means the backing
    /// store is currently unreachable.
    async fn initialize(&self) -> bool;

    /// Cache a tile. Returns whether the write persisted.
    async fn put_tile(&self, data: Bytes, type_id: i32, pos: TilePosition, zoom: i32) -> bool;

    /// Fetch and decode a cached tile, or report a miss.
    async fn get_tile(&self, type_id: i32, pos: TilePosition, zoom: i32) -> Option<Self::Image>;

    /// Delete tiles cached before `cutoff`, optionally limited to one type,
    /// returning how many were removed.
    ///
    /// # Errors
    ///
    /// Implementations that do not track tile age return
    /// [`StoreError::Unsupported`].
    async fn delete_older_than(
        &self,
        cutoff: SystemTime,
        type_id: Option<i32>,
    ) -> Result<u64, StoreError>;
}

#[async_trait]
impl<D: TileDecoder> PersistentTileCache for TileStore<D> {
    type Image = D::Image;

    async fn initialize(&self) -> bool {
        let store = self.clone();
        task::spawn_blocking(move || store.initialize_blocking())
            .await
            .unwrap_or(false)
    }

    async fn put_tile(&self, data: Bytes, type_id: i32, pos: TilePosition, zoom: i32) -> bool {
        let store = self.clone();
        let key = TileKey::at(type_id, zoom, pos);
        task::spawn_blocking(move || store.put_blocking(key, data))
            .await
            .unwrap_or(false)
    }

    async fn get_tile(&self, type_id: i32, pos: TilePosition, zoom: i32) -> Option<Self::Image> {
        let store = self.clone();
        let key = TileKey::at(type_id, zoom, pos);
        task::spawn_blocking(move || store.get_blocking(key))
            .await
            .unwrap_or(None)
    }

    async fn delete_older_than(
        &self,
        cutoff: SystemTime,
        type_id: Option<i32>,
    ) -> Result<u64, StoreError> {
        // No I/O happens on the unsupported path; no need to offload.
        self.delete_older_than_blocking(cutoff, type_id)
    }
}

// =============================================================================
// Tests
// =============================================================================

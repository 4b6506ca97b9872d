//! Store behavior tests through the async cache capability.
//!
//! Tests verify:
//! - Round-trips and misses, including the worked example from the docs
//! - Decoding of stored tiles into images
//! - Self-healing after a simulated connection drop
//! - The chosen duplicate-key policy (second put fails degraded)
//! - Zero-length payloads read as misses
//! - Connection-string mutation and the unsupported eviction operation

use std::time::SystemTime;

use bytes::Bytes;
use image::GenericImageView;

use tile_store::{PersistentTileCache, StoreError, TilePosition};

use super::test_utils::{image_store, png_tile, raw_connection, raw_store};

// =============================================================================
// Round-Trips and Misses
// =============================================================================

#[tokio::test]
async fn test_put_then_get_returns_payload() {
    let (_dir, cache) = raw_store();

    // The worked example: a PNG-looking payload at type=2, (100, 200), zoom 10.
    let data = Bytes::from_static(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]);
    let pos = TilePosition::new(100, 200);

    assert!(cache.put_tile(data.clone(), 2, pos, 10).await);
    assert_eq!(cache.get_tile(2, pos, 10).await, Some(data));

    // A neighboring tile was never written.
    assert!(cache.get_tile(2, TilePosition::new(101, 200), 10).await.is_none());
}

#[tokio::test]
async fn test_get_on_fresh_store_is_a_miss() {
    let (_dir, cache) = raw_store();
    assert!(cache.get_tile(1, TilePosition::new(0, 0), 0).await.is_none());
}

#[tokio::test]
async fn test_keys_are_distinguished_by_every_field() {
    let (_dir, cache) = raw_store();
    let pos = TilePosition::new(5, 6);

    assert!(cache.put_tile(Bytes::from_static(b"one"), 1, pos, 7).await);

    assert!(cache.get_tile(2, pos, 7).await.is_none());
    assert!(cache.get_tile(1, pos, 8).await.is_none());
    assert!(cache.get_tile(1, TilePosition::new(6, 6), 7).await.is_none());
    assert!(cache.get_tile(1, TilePosition::new(5, 7), 7).await.is_none());
    assert_eq!(
        cache.get_tile(1, pos, 7).await,
        Some(Bytes::from_static(b"one"))
    );
}

// =============================================================================
// Image Decoding
// =============================================================================

#[tokio::test]
async fn test_stored_png_decodes_to_image() {
    let (_dir, cache) = image_store();
    let pos = TilePosition::new(3, 4);

    assert!(cache.put_tile(png_tile(200, 100, 50), 1, pos, 12).await);

    let img = cache.get_tile(1, pos, 12).await.expect("stored PNG should decode");
    assert_eq!(img.dimensions(), (8, 8));
    assert_eq!(img.to_rgb8().get_pixel(0, 0), &image::Rgb([200, 100, 50]));
}

#[tokio::test]
async fn test_undecodable_payload_is_a_miss() {
    let (_dir, cache) = image_store();
    let pos = TilePosition::new(3, 4);

    assert!(cache.put_tile(Bytes::from_static(b"not an image"), 1, pos, 12).await);
    assert!(cache.get_tile(1, pos, 12).await.is_none());
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_initialize_is_idempotent_and_lazy() {
    let (_dir, cache) = raw_store();

    assert!(!cache.is_initialized());
    assert!(cache.initialize().await);
    assert!(cache.is_initialized());
    assert!(cache.initialize().await);
}

#[tokio::test]
async fn test_store_self_heals_after_drop() {
    let (_dir, cache) = raw_store();
    let pos = TilePosition::new(7, 8);

    assert!(cache.put_tile(Bytes::from_static(b"tile"), 3, pos, 9).await);

    // Simulate a connection drop; the next get must re-initialize.
    cache.close();
    assert!(!cache.is_initialized());

    assert_eq!(
        cache.get_tile(3, pos, 9).await,
        Some(Bytes::from_static(b"tile"))
    );
    assert!(cache.is_initialized());
}

#[tokio::test]
async fn test_connection_string_change_reconnects() {
    let (dir, cache) = raw_store();
    let pos = TilePosition::new(1, 1);

    assert!(cache.put_tile(Bytes::from_static(b"old"), 1, pos, 1).await);

    let other = dir.path().join("other.db").to_string_lossy().into_owned();
    assert!(cache.set_connection_string(other));

    // The fresh database does not contain the old tile.
    assert!(cache.get_tile(1, pos, 1).await.is_none());
    assert!(cache.put_tile(Bytes::from_static(b"new"), 1, pos, 1).await);
    assert_eq!(
        cache.get_tile(1, pos, 1).await,
        Some(Bytes::from_static(b"new"))
    );
}

// =============================================================================
// Edge Cases
// =============================================================================

#[tokio::test]
async fn test_duplicate_put_fails_degraded_and_keeps_original() {
    let (_dir, cache) = raw_store();
    let pos = TilePosition::new(2, 2);

    assert!(cache.put_tile(Bytes::from_static(b"first"), 1, pos, 2).await);
    assert!(!cache.put_tile(Bytes::from_static(b"second"), 1, pos, 2).await);

    // The failed write degraded the store but did not corrupt it: the
    // original payload is still served after transparent re-initialization.
    assert_eq!(
        cache.get_tile(1, pos, 2).await,
        Some(Bytes::from_static(b"first"))
    );
}

#[tokio::test]
async fn test_zero_length_payload_reads_as_miss() {
    let (dir, cache) = raw_store();
    assert!(cache.initialize().await);

    // Plant an empty blob directly against the schema, bypassing put.
    let conn = raw_connection(&dir);
    conn.execute(
        "INSERT INTO tile_cache (X, Y, Zoom, Type, Tile) VALUES (4, 5, 6, 7, x'')",
        [],
    )
    .unwrap();

    assert!(cache.get_tile(7, TilePosition::new(4, 5), 6).await.is_none());
}

#[tokio::test]
async fn test_delete_older_than_reports_unsupported() {
    let (_dir, cache) = raw_store();

    let result = cache.delete_older_than(SystemTime::now(), Some(2)).await;
    match result {
        Err(StoreError::Unsupported(_)) => {}
        other => panic!("expected Unsupported, got {other:?}"),
    }
}

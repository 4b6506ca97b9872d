//! Concurrency tests: many tasks sharing one store.
//!
//! Tests verify:
//! - N concurrent writers with distinct keys all succeed and are readable
//! - Readers and writers make progress against each other
//! - Concurrent initialization races resolve to a single ready store

use std::time::{Duration, Instant};

use bytes::Bytes;

use tile_store::{PersistentTileCache, TilePosition};

use super::test_utils::raw_store;

#[tokio::test]
async fn test_concurrent_writers_distinct_keys() {
    let (_dir, cache) = raw_store();

    let mut handles = Vec::new();
    for i in 0..32i64 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            let pos = TilePosition::new(i, i + 1);
            cache.put_tile(Bytes::from(vec![i as u8; 512]), 4, pos, 11).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap(), "every distinct-key write must land");
    }

    for i in 0..32i64 {
        let pos = TilePosition::new(i, i + 1);
        assert_eq!(
            cache.get_tile(4, pos, 11).await,
            Some(Bytes::from(vec![i as u8; 512]))
        );
    }
}

#[tokio::test]
async fn test_readers_progress_alongside_writers() {
    let (_dir, cache) = raw_store();

    // Seed rows the readers will hammer.
    for i in 0..8i64 {
        assert!(
            cache
                .put_tile(Bytes::from(vec![i as u8; 4096]), 1, TilePosition::new(i, 0), 5)
                .await
        );
    }

    let started = Instant::now();
    let mut handles = Vec::new();

    for i in 0..8i64 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..25 {
                let got = cache.get_tile(1, TilePosition::new(i, 0), 5).await;
                assert_eq!(got, Some(Bytes::from(vec![i as u8; 4096])));
            }
        }));
    }
    for i in 0..8i64 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            for j in 1..=25i64 {
                let pos = TilePosition::new(i, j);
                assert!(cache.put_tile(Bytes::from(vec![0xEE; 4096]), 1, pos, 5).await);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Generous bound: the point is that neither side starves the other
    // indefinitely, not a performance target.
    assert!(started.elapsed() < Duration::from_secs(60));
}

#[tokio::test]
async fn test_concurrent_first_use_initializes_once() {
    let (_dir, cache) = raw_store();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move { cache.initialize().await }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert!(cache.is_initialized());
}

//! Shared helpers for integration tests.

use std::io::Cursor;

use bytes::Bytes;
use image::{ImageFormat, Rgb, RgbImage};
use rusqlite::Connection;
use tempfile::TempDir;

use tile_store::{ImageTileDecoder, RawTileDecoder, StoreConfig, TileDecoder, TileStore};

/// A temp directory plus a store over a database inside it.
///
/// The directory must outlive the store, so both are returned together.
pub fn raw_store() -> (TempDir, TileStore<RawTileDecoder>) {
    let dir = TempDir::new().unwrap();
    let store = store_with_decoder(&dir, RawTileDecoder);
    (dir, store)
}

/// Like [`raw_store`] but decoding tiles into images.
pub fn image_store() -> (TempDir, TileStore<ImageTileDecoder>) {
    let dir = TempDir::new().unwrap();
    let store = store_with_decoder(&dir, ImageTileDecoder);
    (dir, store)
}

fn store_with_decoder<D: TileDecoder>(dir: &TempDir, decoder: D) -> TileStore<D> {
    let config = StoreConfig::new(db_path(dir));
    TileStore::new(config, decoder).unwrap()
}

/// Path of the test database inside `dir`, as a connection string.
pub fn db_path(dir: &TempDir) -> String {
    dir.path().join("tiles.db").to_string_lossy().into_owned()
}

/// Open a raw connection to the test database, bypassing the store.
pub fn raw_connection(dir: &TempDir) -> Connection {
    Connection::open(dir.path().join("tiles.db")).unwrap()
}

/// Encode a small solid-color PNG usable as tile payload.
pub fn png_tile(r: u8, g: u8, b: u8) -> Bytes {
    let img = RgbImage::from_pixel(8, 8, Rgb([r, g, b]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    Bytes::from(buf.into_inner())
}

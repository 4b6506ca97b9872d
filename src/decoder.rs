//! Tile image decoding collaborators.
//!
//! The store persists opaque bytes; the embedding application decides what a
//! tile *is* by supplying a [`TileDecoder`]. Two implementations ship with
//! the crate:
//!
//! - [`RawTileDecoder`] hands the stored bytes back unchanged, for callers
//!   that treat tiles as blobs (servers re-sending encoded images, tests,
//!   the CLI).
//! - [`ImageTileDecoder`] decodes JPEG/PNG bytes into an
//!   [`image::DynamicImage`] for callers that render tiles.

use bytes::Bytes;
use image::DynamicImage;
use tracing::warn;

/// Converts stored tile bytes into the caller's displayable image type.
///
/// The decoder is consulted only for non-empty payloads that were previously
/// accepted by a `put`. A decoder that cannot make sense of the bytes
/// returns `None`, which the store surfaces as a cache miss; the caller then
/// falls back to its original tile source exactly as for an absent key.
pub trait TileDecoder: Send + Sync + 'static {
    /// The decoded tile representation.
    type Image: Send + 'static;

    /// Decode stored bytes, or decline them.
    fn decode(&self, data: Bytes) -> Option<Self::Image>;
}

/// Pass-through decoder: the "image" is the stored bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTileDecoder;

impl TileDecoder for RawTileDecoder {
    type Image = Bytes;

    fn decode(&self, data: Bytes) -> Option<Bytes> {
        Some(data)
    }
}

/// Decoder producing [`DynamicImage`]s from JPEG or PNG tile bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTileDecoder;

impl TileDecoder for ImageTileDecoder {
    type Image = DynamicImage;

    fn decode(&self, data: Bytes) -> Option<DynamicImage> {
        match image::load_from_memory(&data) {
            Ok(img) => Some(img),
            Err(error) => {
                warn!(%error, len = data.len(), "stored tile bytes failed to decode");
                None
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Composite tile keys.
//!
//! Tiles are addressed by a 4-tuple: provider/type identifier, zoom level,
//! and grid coordinates. The tuple is the primary key of the backing table,
//! so no two stored rows can share all four values.

use std::fmt;

// =============================================================================
// Tile Position
// =============================================================================

/// A tile's grid coordinate at some zoom level.
///
/// Coordinates are 64-bit because deep zoom levels of a global tile grid
/// exceed the 32-bit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilePosition {
    /// Tile X coordinate (0-indexed from the west edge)
    pub x: i64,

    /// Tile Y coordinate (0-indexed from the north edge)
    pub y: i64,
}

impl TilePosition {
    /// Create a new tile position.
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// =============================================================================
// Tile Key
// =============================================================================

/// Composite key identifying one cached tile.
///
/// Mirrors the primary key of the backing table: `(Type, Zoom, X, Y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    /// Tile provider/type identifier
    pub type_id: i32,

    /// Zoom level
    pub zoom: i32,

    /// Tile X coordinate
    pub x: i64,

    /// Tile Y coordinate
    pub y: i64,
}

impl TileKey {
    /// Create a key from its four components.
    pub fn new(type_id: i32, zoom: i32, x: i64, y: i64) -> Self {
        Self { type_id, zoom, x, y }
    }

    /// Create a key from a type, zoom, and grid position.
    pub fn at(type_id: i32, zoom: i32, pos: TilePosition) -> Self {
        Self {
            type_id,
            zoom,
            x: pos.x,
            y: pos.y,
        }
    }

    /// The grid position portion of the key.
    pub fn position(&self) -> TilePosition {
        TilePosition::new(self.x, self.y)
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type={} zoom={} x={} y={}",
            self.type_id, self.zoom, self.x, self.y
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Coordinate type definitions

use std::fmt;

use serde::Serialize;

/// Geographic latitude range accepted at the API boundary.
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LNG: f64 = -180.0;
pub const MAX_LNG: f64 = 180.0;

/// Practical zoom range of the slippy-map pyramid.
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 20;

/// Tile coordinates in the Web Mercator / slippy-map pyramid.
///
/// Values of this type are always inside the tile grid for their zoom;
/// use [`TileCoord::try_new`] to build one from untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TileCoord {
    /// Zoom level (0-20)
    pub z: u8,
    /// X coordinate (east-west), 0 at the antimeridian
    pub x: u32,
    /// Y coordinate (north-south), 0 at the north edge
    pub y: u32,
}

impl TileCoord {
    /// Builds a tile coordinate, rejecting anything outside the grid.
    ///
    /// Takes signed integers so that negative input is reported instead of
    /// wrapping around.
    pub fn try_new(z: i64, x: i64, y: i64) -> Result<Self, CoordError> {
        if !(MIN_ZOOM as i64..=MAX_ZOOM as i64).contains(&z) {
            return Err(CoordError::InvalidZoom(z));
        }
        if !super::is_valid_tile_coord(z, x, y) {
            return Err(CoordError::InvalidTile { z, x, y });
        }
        Ok(Self {
            z: z as u8,
            x: x as u32,
            y: y as u32,
        })
    }

    /// Number of tiles along each axis at this tile's zoom.
    #[inline]
    pub fn grid_size(&self) -> u32 {
        1u32 << self.z
    }

    /// Cache key for this tile under the given provider.
    pub fn cache_key(&self, provider: &str) -> String {
        format!("{}:{}:{}:{}", provider, self.z, self.x, self.y)
    }

    /// Returns this tile and its 8 grid neighbors.
    ///
    /// Ordered row-major starting at the north-west neighbor, so the center
    /// tile is at index 4. X wraps around the antimeridian; Y is clamped at
    /// the poles, which means polar-edge tiles appear more than once.
    pub fn neighborhood(&self) -> [TileCoord; 9] {
        let n = self.grid_size() as i64;
        let mut tiles = [*self; 9];
        let mut idx = 0;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let x = (self.x as i64 + dx).rem_euclid(n);
                let y = (self.y as i64 + dy).clamp(0, n - 1);
                tiles[idx] = TileCoord {
                    z: self.z,
                    x: x as u32,
                    y: y as u32,
                };
                idx += 1;
            }
        }
        tiles
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Fractional position in tile space at a given zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePosition {
    pub x: f64,
    pub y: f64,
    pub zoom: u8,
}

impl TilePosition {
    /// Returns the tile covering this position.
    ///
    /// X wraps modulo the grid size (so longitude 180 lands on tile 0) and
    /// Y is clamped into the grid. Non-finite positions saturate into the grid.
    pub fn tile(&self) -> TileCoord {
        let n = 1i64 << self.zoom;
        let x = (self.x.floor() as i64).rem_euclid(n);
        let y = (self.y.floor() as i64).clamp(0, n - 1);
        TileCoord {
            z: self.zoom,
            x: x as u32,
            y: y as u32,
        }
    }
}

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Geographic bounding box of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TileBounds {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl TileBounds {
    /// Whether the point lies inside (or on the edge of) the box.
    pub fn contains(&self, point: LatLng) -> bool {
        point.lat <= self.north
            && point.lat >= self.south
            && point.lng >= self.west
            && point.lng <= self.east
    }
}

/// Errors from coordinate validation.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside -90..=90 or not finite
    InvalidLatitude(f64),
    /// Longitude is outside -180..=180 or not finite
    InvalidLongitude(f64),
    /// Zoom level is outside the supported range
    InvalidZoom(i64),
    /// Tile x/y is outside the grid for its zoom
    InvalidTile { z: i64, x: i64, y: i64 },
    /// Zoom is valid but not served by the provider
    UnsupportedZoom { zoom: u8, min: u8, max: u8 },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lng) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lng, MIN_LNG, MAX_LNG
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::InvalidTile { z, x, y } => {
                write!(f, "Invalid tile coordinate: {}/{}/{}", z, x, y)
            }
            CoordError::UnsupportedZoom { zoom, min, max } => {
                write!(
                    f,
                    "Zoom level {} not supported by provider (range {}-{})",
                    zoom, min, max
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}

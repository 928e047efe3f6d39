//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator slippy-map tile coordinates, plus the validity checks
//! applied to every tile address before it reaches the cache or network.

mod types;

pub use types::{
    CoordError, LatLng, TileBounds, TileCoord, TilePosition, MAX_LAT, MAX_LNG, MAX_ZOOM, MIN_LAT,
    MIN_LNG, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to a fractional tile position.
///
/// No validation is performed; latitudes at or beyond ±90° produce
/// non-finite `y` values. Use [`validate_lat_lng`] first for user input.
#[inline]
pub fn lat_lng_to_tile(lat: f64, lng: f64, zoom: u8) -> TilePosition {
    let n = 2.0_f64.powi(zoom as i32);
    let x = (lng + 180.0) / 360.0 * n;

    let lat_rad = lat * PI / 180.0;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;

    TilePosition { x, y, zoom }
}

/// Converts a (possibly fractional) tile position back to geographic coordinates.
///
/// Integer inputs give the north-west corner of that tile.
#[inline]
pub fn tile_to_lat_lng(x: f64, y: f64, zoom: u8) -> LatLng {
    let n = 2.0_f64.powi(zoom as i32);

    let lng = x / n * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * y / n)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    LatLng { lat, lng }
}

/// Whether `(z, x, y)` addresses a tile inside the pyramid.
pub fn is_valid_tile_coord(z: i64, x: i64, y: i64) -> bool {
    if !(MIN_ZOOM as i64..=MAX_ZOOM as i64).contains(&z) {
        return false;
    }
    let max = 1i64 << z;
    (0..max).contains(&x) && (0..max).contains(&y)
}

/// Returns the geographic bounding box of a tile.
pub fn tile_bounds(tile: &TileCoord) -> TileBounds {
    let nw = tile_to_lat_lng(tile.x as f64, tile.y as f64, tile.z);
    let se = tile_to_lat_lng(tile.x as f64 + 1.0, tile.y as f64 + 1.0, tile.z);
    TileBounds {
        north: nw.lat,
        south: se.lat,
        west: nw.lng,
        east: se.lng,
    }
}

/// Validates a latitude/longitude pair from an external caller.
pub fn validate_lat_lng(lat: f64, lng: f64) -> Result<(), CoordError> {
    if !lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !lng.is_finite() || !(MIN_LNG..=MAX_LNG).contains(&lng) {
        return Err(CoordError::InvalidLongitude(lng));
    }
    Ok(())
}

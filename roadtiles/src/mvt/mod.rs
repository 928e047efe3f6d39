//! Mapbox Vector Tile decoding
//!
//! Two decoders share the protobuf schema in [`proto`]:
//!
//! - [`parse_vector_tile`] produces a bounded diagnostic summary: every
//!   layer's header plus at most [`SAMPLE_FEATURES_PER_LAYER`] features per
//!   layer, with a few reprojected points when the tile address is known.
//! - [`parse_road_geometries`] decodes every ring of every LineString
//!   feature in full, for distance computation.
//!
//! Neither decoder fails. Corrupt input, including gzip payloads that do not
//! inflate, produces an empty result whose statistics still report the
//! input size and parse time.

pub mod geometry;
pub mod proto;
mod types;

pub use types::{
    Feature, GeometryType, LayerInfo, ParsedTile, Properties, PropertyValue, RoadGeometry,
    TileStatistics, DEFAULT_EXTENT,
};

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::Read;
use std::time::Instant;

use flate2::read::GzDecoder;
use prost::Message;
use tracing::{debug, trace};

use crate::coord::{tile_to_lat_lng, LatLng, TileCoord};

/// Features sampled per layer by [`parse_vector_tile`].
pub const SAMPLE_FEATURES_PER_LAYER: usize = 10;

/// Points of the first ring reprojected for each sampled feature.
pub const SAMPLE_POINTS_PER_FEATURE: usize = 3;

/// Ceiling on the inflated size of a gzip-compressed tile (16 MiB).
pub const MAX_INFLATED_BYTES: u64 = 16 * 1024 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Inflate gzip payloads, pass anything else through.
fn inflate(buffer: &[u8]) -> Option<Cow<'_, [u8]>> {
    if !buffer.starts_with(&GZIP_MAGIC) {
        return Some(Cow::Borrowed(buffer));
    }
    let mut out = Vec::new();
    let mut decoder = GzDecoder::new(buffer).take(MAX_INFLATED_BYTES);
    match decoder.read_to_end(&mut out) {
        Ok(_) => Some(Cow::Owned(out)),
        Err(e) => {
            debug!(error = %e, "Failed to inflate gzip tile");
            None
        }
    }
}

fn decode(buffer: &[u8]) -> Option<proto::VectorTile> {
    let raw = inflate(buffer)?;
    match proto::VectorTile::decode(raw.as_ref()) {
        Ok(tile) => Some(tile),
        Err(e) => {
            debug!(error = %e, bytes = buffer.len(), "Failed to decode vector tile");
            None
        }
    }
}

fn layer_extent(layer: &proto::Layer) -> u32 {
    match layer.extent {
        Some(extent) if extent > 0 => extent,
        _ => DEFAULT_EXTENT,
    }
}

fn feature_properties(layer: &proto::Layer, feature: &proto::Feature) -> Properties {
    let mut properties = Properties::new();
    for pair in feature.tags.chunks_exact(2) {
        let Some(key) = layer.keys.get(pair[0] as usize) else {
            continue;
        };
        let Some(value) = layer
            .values
            .get(pair[1] as usize)
            .and_then(PropertyValue::from_proto)
        else {
            continue;
        };
        properties.insert(key.clone(), value);
    }
    properties
}

/// Reproject a tile-local pixel to geographic coordinates.
fn pixel_to_lat_lng(tile: &TileCoord, extent: u32, px: i32, py: i32) -> LatLng {
    let extent = f64::from(extent);
    let tile_x = f64::from(tile.x) + f64::from(px) / extent;
    let tile_y = f64::from(tile.y) + f64::from(py) / extent;
    tile_to_lat_lng(tile_x, tile_y, tile.z)
}

/// Decode a tile into layer summaries and a bounded feature sample.
///
/// When `tile` is given, each sampled feature carries up to
/// [`SAMPLE_POINTS_PER_FEATURE`] points of its first ring in lat/lng.
pub fn parse_vector_tile(buffer: &[u8], tile: Option<TileCoord>) -> ParsedTile {
    let start = Instant::now();
    let mut layers = BTreeMap::new();
    let mut features = Vec::new();

    if let Some(decoded) = decode(buffer) {
        for layer in &decoded.layers {
            let extent = layer_extent(layer);
            layers.insert(
                layer.name.clone(),
                LayerInfo {
                    name: layer.name.clone(),
                    feature_count: layer.features.len(),
                    extent,
                    version: layer.version,
                },
            );

            for feature in layer.features.iter().take(SAMPLE_FEATURES_PER_LAYER) {
                let sample_geometry = tile.as_ref().and_then(|tile| {
                    let rings = geometry::decode_rings(&feature.geometry);
                    let first = rings.into_iter().next()?;
                    Some(
                        first
                            .into_iter()
                            .take(SAMPLE_POINTS_PER_FEATURE)
                            .map(|(px, py)| pixel_to_lat_lng(tile, extent, px, py))
                            .collect(),
                    )
                });

                features.push(Feature {
                    id: feature.id,
                    geometry_type: GeometryType::from_raw(feature.geometry_type),
                    properties: feature_properties(layer, feature),
                    sample_geometry,
                    layer_name: layer.name.clone(),
                });
            }
        }
    }

    let statistics = TileStatistics {
        size_bytes: buffer.len(),
        layer_count: layers.len(),
        features_total: features.len(),
        parse_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    };
    trace!(
        bytes = statistics.size_bytes,
        layers = statistics.layer_count,
        features = statistics.features_total,
        "Parsed vector tile"
    );

    ParsedTile {
        layers,
        features,
        statistics,
    }
}

/// Decode every LineString ring in the tile into geographic polylines.
///
/// Features of other geometry types are skipped. Rings keep their feature's
/// properties and layer name; output order follows layer then feature order.
pub fn parse_road_geometries(buffer: &[u8], tile: TileCoord) -> Vec<RoadGeometry> {
    let Some(decoded) = decode(buffer) else {
        return Vec::new();
    };

    let mut roads = Vec::new();
    for layer in &decoded.layers {
        let extent = layer_extent(layer);
        for feature in &layer.features {
            if GeometryType::from_raw(feature.geometry_type) != GeometryType::LineString {
                continue;
            }
            let properties = feature_properties(layer, feature);
            for ring in geometry::decode_rings(&feature.geometry) {
                roads.push(RoadGeometry {
                    layer_name: layer.name.clone(),
                    properties: properties.clone(),
                    coordinates: ring
                        .into_iter()
                        .map(|(px, py)| pixel_to_lat_lng(&tile, extent, px, py))
                        .collect(),
                });
            }
        }
    }
    trace!(tile = %tile, roads = roads.len(), "Decoded road geometries");
    roads
}

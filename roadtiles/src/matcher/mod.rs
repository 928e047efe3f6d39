//! Nearest-road matching for GPS coordinates.
//!
//! A match fetches the tile covering the point and its eight neighbours
//! through the composite (so repeated matches nearby hit the cache),
//! decodes every LineString in full and picks the road with the smallest
//! point-to-polyline distance.

pub mod distance;

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, trace};

use crate::composite::TileComposite;
use crate::coord::{lat_lng_to_tile, validate_lat_lng, LatLng, TileCoord};
use crate::error::ServiceError;
use crate::mvt::{self, RoadGeometry};
use crate::provider::KERALA_PWD_NAME;

/// Preferred working zoom, clamped into the provider's range.
pub const DEFAULT_PREFERRED_ZOOM: u8 = 14;

/// Distance at which confidence reaches zero.
pub const DEFAULT_MAX_RADIUS_M: f64 = 100.0;

const NAME_KEYS: [&str; 3] = ["name", "road_name", "RD_NAME"];
const TYPE_KEYS: [&str; 3] = ["type", "road_type", "RD_TYPE"];
const ID_KEYS: [&str; 3] = ["id", "road_id", "RD_ID"];
const DISTRICT_KEYS: [&str; 2] = ["district", "DISTRICT"];

const UNKNOWN_ROAD_NAME: &str = "Unknown";
const DEFAULT_ROAD_TYPE: &str = "ROAD";

#[derive(Debug, Clone, PartialEq)]
pub struct RoadMatcherConfig {
    /// Provider the road tiles come from.
    pub provider: String,
    pub preferred_zoom: u8,
    pub max_radius_m: f64,
}

impl Default for RoadMatcherConfig {
    fn default() -> Self {
        Self {
            provider: KERALA_PWD_NAME.to_string(),
            preferred_zoom: DEFAULT_PREFERRED_ZOOM,
            max_radius_m: DEFAULT_MAX_RADIUS_M,
        }
    }
}

/// The road nearest to a queried point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadMatchResult {
    pub road_name: String,
    pub road_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    pub layer_name: String,
    pub distance_meters: f64,
    /// 0 to 100; 100 for a road under the point, 0 at or past the max radius.
    pub confidence: u8,
    /// Tile covering the query point.
    pub tile: TileCoord,
}

/// Confidence score for a match at `distance_m`.
pub fn confidence(distance_m: f64, max_radius_m: f64) -> u8 {
    if max_radius_m <= 0.0 {
        return if distance_m <= 0.0 { 100 } else { 0 };
    }
    (100.0 - distance_m / max_radius_m * 100.0)
        .round()
        .clamp(0.0, 100.0) as u8
}

/// Matches coordinates to the nearest road in the configured provider's tiles.
pub struct RoadMatcher {
    composite: Arc<TileComposite>,
    config: RoadMatcherConfig,
}

impl RoadMatcher {
    pub fn new(composite: Arc<TileComposite>, config: RoadMatcherConfig) -> Self {
        Self { composite, config }
    }

    pub fn config(&self) -> &RoadMatcherConfig {
        &self.config
    }

    /// Working zoom: the preferred zoom clamped into the provider's range.
    pub fn working_zoom(&self) -> Result<u8, ServiceError> {
        let meta = self.composite.metadata(&self.config.provider)?;
        Ok(self
            .config
            .preferred_zoom
            .clamp(meta.min_zoom, meta.max_zoom.max(meta.min_zoom)))
    }

    /// Find the nearest road to `(lat, lng)`.
    ///
    /// Returns `Ok(None)` when no LineString features exist in the 3×3 tile
    /// neighbourhood, including when every tile fetch failed.
    pub async fn match_road(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<Option<RoadMatchResult>, ServiceError> {
        validate_lat_lng(lat, lng)?;
        let zoom = self.working_zoom()?;
        let center = lat_lng_to_tile(lat, lng, zoom).tile();

        let mut tiles: Vec<TileCoord> = Vec::with_capacity(9);
        for tile in center.neighborhood() {
            if !tiles.contains(&tile) {
                tiles.push(tile);
            }
        }

        let provider = self.config.provider.as_str();
        let fetches = tiles.iter().map(|&tile| async move {
            match self.composite.fetch_coord(provider, tile).await {
                Ok(bytes) => mvt::parse_road_geometries(&bytes.data, tile),
                Err(e) => {
                    debug!(tile = %tile, error = %e, "Neighbour tile unavailable");
                    Vec::new()
                }
            }
        });
        let roads: Vec<RoadGeometry> = join_all(fetches).await.into_iter().flatten().collect();
        trace!(tile = %center, candidates = roads.len(), "Collected road candidates");

        let point = LatLng::new(lat, lng);
        let mut best: Option<(&RoadGeometry, f64)> = None;
        for road in &roads {
            let Some(d) = distance::point_to_polyline_m(point, &road.coordinates) else {
                continue;
            };
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((road, d));
            }
        }

        let Some((road, distance_m)) = best else {
            debug!(lat, lng, "No road found near point");
            return Ok(None);
        };

        let result = RoadMatchResult {
            road_name: road
                .property_text(&NAME_KEYS)
                .unwrap_or_else(|| UNKNOWN_ROAD_NAME.to_string()),
            road_type: road
                .property_text(&TYPE_KEYS)
                .unwrap_or_else(|| DEFAULT_ROAD_TYPE.to_string()),
            road_id: road.property_text(&ID_KEYS),
            district: road.property_text(&DISTRICT_KEYS),
            layer_name: road.layer_name.clone(),
            distance_meters: distance_m,
            confidence: confidence(distance_m, self.config.max_radius_m),
            tile: center,
        };
        debug!(
            road = result.road_name.as_str(),
            distance_m = result.distance_meters,
            confidence = result.confidence,
            "Matched road"
        );
        Ok(Some(result))
    }
}

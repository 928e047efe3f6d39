//! Integration tests for the road tile service.
//!
//! These tests drive the public API end to end over a fake HTTP upstream:
//! - HTTP provider → composite cache → road matcher
//! - Diagnostic parsing of fetched tiles
//! - Officials lookup and per-client rate limiting through the facade
//!
//! Run with: `cargo test --test road_service_integration`

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use prost::Message;

use roadtiles::cache::{CacheConfig, TileCache};
use roadtiles::composite::TileComposite;
use roadtiles::coord::{lat_lng_to_tile, TileCoord};
use roadtiles::error::ServiceError;
use roadtiles::matcher::{RoadMatcher, RoadMatcherConfig};
use roadtiles::mvt::{geometry, proto, GeometryType};
use roadtiles::officials::{OfficialsClient, OfficialsConfig};
use roadtiles::provider::{
    AsyncHttpClient, HttpProviderConfig, HttpResponse, HttpTileProvider, ProviderError,
    KERALA_PWD_NAME,
};
use roadtiles::rate_limit::RateLimitConfig;
use roadtiles::service::RoadTileService;

// ============================================================================
// Helper Functions
// ============================================================================

/// Thiruvananthapuram, on the MC Road.
const LAT: f64 = 8.5241;
const LNG: f64 = 76.9366;
const ZOOM: u8 = 14;
const EXTENT: f64 = 4096.0;

const BASE_URL: &str = "https://tiles.test/kstp";

const OFFICIALS_JSON: &str = r#"{
    "roadStartsAt": "Kesavadasapuram",
    "roadEndsAt": "Kilimanoor",
    "division": "Roads Division Thiruvananthapuram",
    "mobileEE": "9446000001",
    "emailAEE": "aee@example.org",
    "measuredLength": 31.5
}"#;

/// Upstream serving a fixed set of tiles and the officials registry.
struct FakeUpstream {
    tiles: HashMap<String, Vec<u8>>,
    tile_requests: AtomicUsize,
    registry_requests: AtomicUsize,
}

impl FakeUpstream {
    fn new() -> Self {
        Self {
            tiles: HashMap::new(),
            tile_requests: AtomicUsize::new(0),
            registry_requests: AtomicUsize::new(0),
        }
    }

    fn with_tile(mut self, tile: TileCoord, body: Vec<u8>) -> Self {
        self.tiles.insert(
            format!("{}/{}/{}/{}.mvt", BASE_URL, tile.z, tile.x, tile.y),
            body,
        );
        self
    }

    fn tile_requests(&self) -> usize {
        self.tile_requests.load(Ordering::SeqCst)
    }
}

fn response(status: u16, content_type: &str, body: &[u8]) -> HttpResponse {
    HttpResponse {
        status,
        content_type: Some(content_type.to_string()),
        body: Bytes::copy_from_slice(body),
    }
}

/// Shared handle so tile and registry clients count into one upstream.
#[derive(Clone)]
struct FakeHttp(Arc<FakeUpstream>);

impl AsyncHttpClient for FakeHttp {
    async fn get(
        &self,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<HttpResponse, ProviderError> {
        let upstream = &self.0;
        if url.contains("/network-sections/") {
            upstream.registry_requests.fetch_add(1, Ordering::SeqCst);
            return Ok(response(200, "application/json", OFFICIALS_JSON.as_bytes()));
        }

        upstream.tile_requests.fetch_add(1, Ordering::SeqCst);
        Ok(match upstream.tiles.get(url) {
            Some(body) => response(200, "application/x-protobuf", body),
            None => response(404, "text/plain", b"not found"),
        })
    }
}

/// Tile covering the query point, and the point's pixel position inside it.
fn query_tile() -> (TileCoord, (i32, i32)) {
    let pos = lat_lng_to_tile(LAT, LNG, ZOOM);
    let tile = pos.tile();
    let px = ((pos.x - tile.x as f64) * EXTENT).round() as i32;
    let py = ((pos.y - tile.y as f64) * EXTENT).round() as i32;
    (tile, (px, py))
}

/// One-layer tile holding an east-west road through `row` and a
/// north-south road `offset` pixels east of `column`.
fn roads_tile(column: i32, row: i32, offset: i32) -> Vec<u8> {
    let keys = vec![
        "RD_NAME".to_string(),
        "RD_TYPE".to_string(),
        "RD_ID".to_string(),
        "DISTRICT".to_string(),
    ];
    let text = |s: &str| proto::Value {
        string_value: Some(s.to_string()),
        ..Default::default()
    };
    let values = vec![
        text("MC Road"),
        text("SH"),
        text("1207"),
        text("Thiruvananthapuram"),
        text("Pattom Link"),
    ];

    let feature = |id: u64, tags: Vec<u32>, line: &[(i32, i32)]| proto::Feature {
        id: Some(id),
        tags,
        geometry_type: Some(proto::GeomType::LineString as i32),
        geometry: geometry::encode_line(line),
    };

    proto::VectorTile {
        layers: vec![proto::Layer {
            name: "kstp_roads".to_string(),
            features: vec![
                feature(1, vec![0, 0, 1, 1, 2, 2, 3, 3], &[(0, row), (4096, row)]),
                feature(2, vec![0, 4], &[(column + offset, 0), (column + offset, 4096)]),
            ],
            keys,
            values,
            extent: Some(4096),
            version: 2,
        }],
    }
    .encode_to_vec()
}

fn composite(upstream: Arc<FakeUpstream>) -> Arc<TileComposite> {
    let config = HttpProviderConfig::kerala_pwd().with_base_url(BASE_URL);
    let mut composite = TileComposite::new(Arc::new(TileCache::new(CacheConfig::default())));
    composite.register(Arc::new(HttpTileProvider::new(FakeHttp(upstream), config)));
    Arc::new(composite)
}

// ============================================================================
// Road matching
// ============================================================================

#[tokio::test]
async fn test_match_road_over_http_provider() {
    let (tile, (column, row)) = query_tile();
    let upstream = Arc::new(FakeUpstream::new().with_tile(tile, roads_tile(column, row, 200)));
    let matcher = RoadMatcher::new(composite(upstream.clone()), RoadMatcherConfig::default());

    let road = matcher.match_road(LAT, LNG).await.unwrap().expect("road match");

    assert_eq!(road.road_name, "MC Road");
    assert_eq!(road.road_type, "SH");
    assert_eq!(road.road_id.as_deref(), Some("1207"));
    assert_eq!(road.district.as_deref(), Some("Thiruvananthapuram"));
    assert_eq!(road.layer_name, "kstp_roads");
    assert_eq!(road.tile, tile);
    assert!(road.distance_meters < 2.0, "distance {}", road.distance_meters);
    assert!(road.confidence >= 98);

    // Eight neighbours 404 and are tolerated; each is requested once.
    assert_eq!(upstream.tile_requests(), 9);

    let again = matcher.match_road(LAT, LNG).await.unwrap().expect("road match");
    assert_eq!(again.road_name, road.road_name);
    assert_eq!(upstream.tile_requests(), 9 + 8);
}

#[tokio::test]
async fn test_match_road_nothing_nearby() {
    let upstream = Arc::new(FakeUpstream::new());
    let matcher = RoadMatcher::new(composite(upstream.clone()), RoadMatcherConfig::default());

    assert_eq!(matcher.match_road(LAT, LNG).await.unwrap(), None);
    assert_eq!(upstream.tile_requests(), 9);
}

#[tokio::test]
async fn test_match_road_rejects_bad_coordinates() {
    let upstream = Arc::new(FakeUpstream::new());
    let matcher = RoadMatcher::new(composite(upstream.clone()), RoadMatcherConfig::default());

    for (lat, lng) in [(91.0, 76.9), (8.5, -181.0), (f64::NAN, 76.9)] {
        let err = matcher.match_road(lat, lng).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCoordinate(_)));
    }
    assert_eq!(upstream.tile_requests(), 0);
}

// ============================================================================
// Fetch and parse
// ============================================================================

#[tokio::test]
async fn test_fetched_tile_parses_with_samples() {
    let (tile, (column, row)) = query_tile();
    let upstream = Arc::new(FakeUpstream::new().with_tile(tile, roads_tile(column, row, 0)));
    let composite = composite(upstream.clone());

    let fetched = composite
        .fetch_tile(KERALA_PWD_NAME, tile.z as i64, tile.x as i64, tile.y as i64)
        .await
        .unwrap();
    assert!(!fetched.cached);
    assert_eq!(fetched.content_type, "application/x-protobuf");

    let parsed = composite
        .parse_tile(KERALA_PWD_NAME, &fetched.data, Some(tile))
        .unwrap();
    assert_eq!(parsed.statistics.layer_count, 1);
    assert_eq!(parsed.statistics.features_total, 2);
    assert_eq!(parsed.layers["kstp_roads"].feature_count, 2);

    let first = &parsed.features[0];
    assert_eq!(first.geometry_type, GeometryType::LineString);
    assert_eq!(first.properties["RD_NAME"].as_str(), Some("MC Road"));
    let sample = first.sample_geometry.as_ref().expect("sampled points");
    assert_eq!(sample.len(), 2);
    assert!((sample[0].lat - LAT).abs() < 0.001);

    let cached = composite
        .fetch_coord(KERALA_PWD_NAME, tile)
        .await
        .unwrap();
    assert!(cached.cached);
    assert_eq!(cached.data, fetched.data);
    assert_eq!(upstream.tile_requests(), 1);
}

#[tokio::test]
async fn test_missing_tile_is_not_found() {
    let upstream = Arc::new(FakeUpstream::new());
    let composite = composite(upstream.clone());

    let err = composite
        .fetch_tile(KERALA_PWD_NAME, 12, 2923, 1932)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(upstream.tile_requests(), 1);
    assert_eq!(composite.cache_stats().keys, 0);
}

// ============================================================================
// Service facade
// ============================================================================

fn service(upstream: Arc<FakeUpstream>, max_requests: u32) -> RoadTileService<FakeHttp> {
    RoadTileService::from_parts(
        composite(upstream.clone()),
        RoadMatcherConfig::default(),
        RateLimitConfig {
            enabled: true,
            window: Duration::from_secs(900),
            max_requests,
        },
        Arc::new(OfficialsClient::new(FakeHttp(upstream), OfficialsConfig::default())),
    )
}

#[tokio::test]
async fn test_match_then_officials() {
    let (tile, (column, row)) = query_tile();
    let upstream = Arc::new(FakeUpstream::new().with_tile(tile, roads_tile(column, row, 300)));
    let service = service(upstream.clone(), 100);

    let road = service
        .match_road("203.0.113.7", LAT, LNG)
        .await
        .unwrap()
        .expect("road match");
    let section = roadtiles::officials::parse_section_id(road.road_id.as_deref().unwrap_or(""))
        .unwrap();

    let lookup = service.officials("203.0.113.7", section).await.unwrap();
    assert!(!lookup.cached);
    assert_eq!(lookup.data.road_ends_at.as_deref(), Some("Kilimanoor"));
    assert_eq!(lookup.data.officials.ee.mobile, "9446000001");
    assert_eq!(lookup.data.officials.aee.email, "aee@example.org");
    assert_eq!(lookup.data.officials.ae.mobile, "");
    assert_eq!(lookup.data.measured_length, Some(31.5));

    let again = service.officials("203.0.113.7", section).await.unwrap();
    assert!(again.cached);
    assert_eq!(upstream.registry_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rate_limit_per_client() {
    let upstream = Arc::new(FakeUpstream::new());
    let service = service(upstream.clone(), 3);

    for _ in 0..3 {
        service
            .parse_tile("203.0.113.7", KERALA_PWD_NAME, &[0x1a, 0x00], None)
            .unwrap();
    }
    let err = service
        .fetch_tile("203.0.113.7", KERALA_PWD_NAME, 14, 0, 0)
        .await
        .unwrap_err();
    match err {
        ServiceError::RateLimited { retry_after_ms, .. } => {
            assert!(retry_after_ms > 0 && retry_after_ms <= 900_000);
        }
        other => panic!("expected rate limit, got {:?}", other),
    }
    assert_eq!(upstream.tile_requests(), 0);

    assert!(service
        .parse_tile("198.51.100.9", KERALA_PWD_NAME, &[0x1a, 0x00], None)
        .is_ok());
}

//! Ground distances between geographic points and polylines.
//!
//! Point-to-segment distance uses a local equirectangular projection
//! centred on the query point. Over the few hundred metres a road match
//! spans, its error against the great-circle distance is far below a metre.

use crate::coord::LatLng;

/// Mean earth radius in metres (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance in metres.
pub fn haversine_m(a: LatLng, b: LatLng) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Project `p` into metres east/north of `origin`.
fn project(origin: LatLng, p: LatLng) -> (f64, f64) {
    let mut dlng = p.lng - origin.lng;
    if dlng > 180.0 {
        dlng -= 360.0;
    } else if dlng < -180.0 {
        dlng += 360.0;
    }
    let x = dlng.to_radians() * origin.lat.to_radians().cos() * EARTH_RADIUS_M;
    let y = (p.lat - origin.lat).to_radians() * EARTH_RADIUS_M;
    (x, y)
}

/// Distance in metres from `point` to the segment `a`–`b`.
pub fn point_to_segment_m(point: LatLng, a: LatLng, b: LatLng) -> f64 {
    let (ax, ay) = project(point, a);
    let (bx, by) = project(point, b);
    let (dx, dy) = (bx - ax, by - ay);

    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (-(ax * dx + ay * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    (cx * cx + cy * cy).sqrt()
}

/// Minimum distance in metres from `point` to any segment of `line`.
///
/// `None` for lines with fewer than two vertices.
pub fn point_to_polyline_m(point: LatLng, line: &[LatLng]) -> Option<f64> {
    line.windows(2)
        .map(|pair| point_to_segment_m(point, pair[0], pair[1]))
        .min_by(f64::total_cmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ll(lat: f64, lng: f64) -> LatLng {
        LatLng::new(lat, lng)
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine_m(ll(0.0, 0.0), ll(1.0, 0.0));
        assert!((d - 111_195.08).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_point_on_segment_is_zero() {
        let d = point_to_segment_m(ll(8.5, 76.95), ll(8.5, 76.9), ll(8.5, 77.0));
        assert!(d < 0.01, "got {}", d);
    }

    #[test]
    fn test_perpendicular_matches_haversine() {
        let point = ll(8.5005, 76.95);
        let d = point_to_segment_m(point, ll(8.5, 76.9), ll(8.5, 77.0));
        let expected = haversine_m(point, ll(8.5, 76.95));
        assert!((d - expected).abs() < 1.0, "got {} expected {}", d, expected);
    }

    #[test]
    fn test_beyond_endpoint_measures_to_endpoint() {
        let point = ll(8.5, 77.001);
        let d = point_to_segment_m(point, ll(8.5, 76.9), ll(8.5, 77.0));
        let expected = haversine_m(point, ll(8.5, 77.0));
        assert!((d - expected).abs() < 0.5, "got {} expected {}", d, expected);
    }

    #[test]
    fn test_degenerate_segment() {
        let a = ll(8.5, 76.9);
        let point = ll(8.5001, 76.9);
        let d = point_to_segment_m(point, a, a);
        assert!((d - haversine_m(point, a)).abs() < 0.1);
    }

    #[test]
    fn test_polyline_minimum() {
        let line = [ll(8.5, 76.9), ll(8.5, 77.0), ll(8.6, 77.0)];
        let point = ll(8.55, 77.0002);
        let d = point_to_polyline_m(point, &line).unwrap();
        let expected = haversine_m(point, ll(8.55, 77.0));
        assert!((d - expected).abs() < 1.0);
        assert_eq!(point_to_polyline_m(point, &line[..1]), None);
    }

    #[test]
    fn test_antimeridian_wrap() {
        let d = point_to_segment_m(ll(0.0, 179.9999), ll(0.0, -179.9999), ll(1.0, -179.9999));
        assert!(d < 30.0, "got {}", d);
    }
}

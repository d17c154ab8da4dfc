//! Routes selected for navigation.
//!
//! A route is produced by the route-optimization backend and arrives as
//! JSON. Its geometry is an ordered list of `[lat, lon]` pairs plus
//! display metadata. Geometry can also be imported from a GPX file
//! using the `gpx` crate.

use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::error::NavError;
use crate::nav::path_length;

/// A geographic coordinate, serialized as a `[lat, lon]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl From<[f64; 2]> for Point {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Point { lat, lon }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.lat, p.lon]
    }
}

impl Point {
    pub(crate) fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A candidate route as returned by the routing backend.
///
/// Only `route` (the geometry) is required; the remaining fields are
/// descriptive and default when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Route {
    pub rank: u32,
    pub is_recommended: bool,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    pub description: String,
    pub distance_km: f64,
    pub duration_min: f64,
    pub safety_score: f64,
    pub distance_display: String,
    pub duration_display: String,
    pub safety_display: String,
    pub reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(rename = "route")]
    pub points: Vec<Point>,
}

/// Colour band used to draw a route according to its safety score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyBand {
    VerySafe,
    Safe,
    Moderate,
    Risky,
}

impl SafetyBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            SafetyBand::VerySafe
        } else if score >= 75.0 {
            SafetyBand::Safe
        } else if score >= 60.0 {
            SafetyBand::Moderate
        } else {
            SafetyBand::Risky
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            SafetyBand::VerySafe => "#059669",
            SafetyBand::Safe => "#1e40af",
            SafetyBand::Moderate => "#d97706",
            SafetyBand::Risky => "#b91c1c",
        }
    }
}

impl Route {
    /// Build a bare route from geometry alone.
    pub fn from_points(points: Vec<Point>) -> Self {
        Route {
            points,
            ..Default::default()
        }
    }

    /// Parse a backend route object.
    pub fn from_json(json: &str) -> Result<Self, NavError> {
        let route: Route = serde_json::from_str(json).map_err(NavError::RouteJson)?;
        route.validate()?;
        Ok(route)
    }

    /// Check that the route can be navigated: at least one point, and
    /// every point a finite coordinate within WGS84 bounds.
    pub fn validate(&self) -> Result<(), NavError> {
        if self.points.is_empty() {
            return Err(NavError::EmptyRoute);
        }
        if let Some((index, p)) = self.points.iter().enumerate().find(|(_, p)| !p.is_valid()) {
            return Err(NavError::InvalidCoordinate { index, lat: p.lat, lon: p.lon });
        }
        Ok(())
    }

    pub fn origin(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn destination(&self) -> Option<&Point> {
        self.points.last()
    }

    pub fn safety_band(&self) -> SafetyBand {
        SafetyBand::from_score(self.safety_score)
    }

    /// Identifier the feedback service rates this route under.
    pub fn rating_id(&self) -> String {
        format!("route_{}", self.rank)
    }

    /// Geometric length of the route in meters.
    pub fn length_m(&self) -> f64 {
        path_length(&self.points)
    }
}

/// Import route geometry from a GPX document.
///
/// Uses the first `<rte>` if present, otherwise the first `<trk>` with
/// its segments flattened into one point list.
pub fn from_gpx<R: Read>(reader: R) -> Result<Route, NavError> {
    let gpx = gpx::read(reader)?;

    let (name, points): (Option<String>, Vec<Point>) = if let Some(r) = gpx.routes.first() {
        (r.name.clone(), r.points.iter().map(waypoint_point).collect())
    } else if let Some(t) = gpx.tracks.first() {
        let points = t
            .segments
            .iter()
            .flat_map(|seg| seg.points.iter())
            .map(waypoint_point)
            .collect();
        (t.name.clone(), points)
    } else {
        (None, Vec::new())
    };

    if points.is_empty() {
        return Err(NavError::NoGeometry);
    }

    let mut route = Route::from_points(points);
    route.description = name.unwrap_or_default();
    route.distance_km = route.length_m() / 1000.0;
    route.validate()?;
    Ok(route)
}

pub(crate) fn waypoint_point(wp: &gpx::Waypoint) -> Point {
    Point {
        lat: wp.point().y(),
        lon: wp.point().x(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKEND_ROUTE: &str = r#"{
        "rank": 2,
        "is_recommended": true,
        "category": "Safest",
        "emoji": "🛡️",
        "description": "Well-lit main roads",
        "distance_km": 1.4,
        "duration_min": 18,
        "safety_score": 91.5,
        "crime_density": 0.2,
        "lighting_score": 88,
        "distance_display": "1.4 km",
        "duration_display": "18 min",
        "safety_display": "91/100",
        "reasons": ["Main roads", "Good lighting"],
        "route": [[12.9716, 77.5946], [12.9720, 77.5950], [12.9730, 77.5960]]
    }"#;

    #[test]
    fn parse_backend_route() {
        let route = Route::from_json(BACKEND_ROUTE).unwrap();

        assert_eq!(route.rank, 2);
        assert_eq!(route.category, "Safest");
        assert_eq!(route.points.len(), 3);
        assert!((route.points[0].lat - 12.9716).abs() < 1e-9);
        assert!((route.points[0].lon - 77.5946).abs() < 1e-9);
        assert_eq!(route.safety_band(), SafetyBand::VerySafe);
        assert_eq!(route.rating_id(), "route_2");
    }

    #[test]
    fn parse_route_with_only_geometry() {
        let route = Route::from_json(r#"{"route": [[1.0, 2.0]]}"#).unwrap();
        assert_eq!(route.points.len(), 1);
        assert_eq!(route.category, "");
        assert!(route.warning.is_none());
    }

    #[test]
    fn empty_route_is_rejected() {
        let err = Route::from_json(r#"{"route": []}"#).unwrap_err();
        assert!(matches!(err, NavError::EmptyRoute));

        let err = Route::from_json(r#"{"category": "Fastest"}"#).unwrap_err();
        assert!(matches!(err, NavError::EmptyRoute));
    }

    #[test]
    fn out_of_range_point_is_rejected() {
        let err = Route::from_json(r#"{"route": [[0.0, 0.0], [95.0, 0.0]]}"#).unwrap_err();
        assert!(matches!(err, NavError::InvalidCoordinate { index: 1, .. }));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = Route::from_json("{not json").unwrap_err();
        assert!(matches!(err, NavError::RouteJson(_)));
    }

    #[test]
    fn points_serialize_as_pairs() {
        let route = Route::from_points(vec![Point { lat: 1.5, lon: 2.5 }]);
        let value = serde_json::to_value(&route).unwrap();
        assert_eq!(value["route"][0][0], 1.5);
        assert_eq!(value["route"][0][1], 2.5);
    }

    #[test]
    fn safety_bands() {
        assert_eq!(SafetyBand::from_score(90.0), SafetyBand::VerySafe);
        assert_eq!(SafetyBand::from_score(75.0), SafetyBand::Safe);
        assert_eq!(SafetyBand::from_score(60.0), SafetyBand::Moderate);
        assert_eq!(SafetyBand::from_score(59.9), SafetyBand::Risky);
        assert_eq!(SafetyBand::Risky.color(), "#b91c1c");
    }

    #[test]
    fn gpx_route_is_preferred_over_track() {
        let gpx = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"
     xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="48.0" lon="16.0"></trkpt>
    </trkseg>
  </trk>
  <rte>
    <name>Walk home</name>
    <rtept lat="12.9716" lon="77.5946"></rtept>
    <rtept lat="12.9730" lon="77.5960"></rtept>
  </rte>
</gpx>"#;

        let route = from_gpx(gpx.as_bytes()).unwrap();
        assert_eq!(route.description, "Walk home");
        assert_eq!(route.points.len(), 2);
        assert!((route.points[1].lat - 12.9730).abs() < 1e-6);
        assert!(route.distance_km > 0.2 && route.distance_km < 0.3);
    }

    #[test]
    fn gpx_track_segments_are_flattened() {
        let gpx = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"
     xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="48.0" lon="16.0"></trkpt>
      <trkpt lat="48.1" lon="16.1"></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="48.2" lon="16.2"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

        let route = from_gpx(gpx.as_bytes()).unwrap();
        assert_eq!(route.points.len(), 3);
    }

    #[test]
    fn gpx_without_geometry_is_rejected() {
        let empty = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"
     xmlns="http://www.topografix.com/GPX/1/1">
</gpx>"#;

        assert!(matches!(from_gpx(empty.as_bytes()), Err(NavError::NoGeometry)));
        assert!(matches!(from_gpx(&b"not xml at all"[..]), Err(NavError::Gpx(_))));
    }
}

//! Great-circle computations.
//!
//! Distance, bearing and compass-sector helpers shared by the tracker
//! and the step planner. All coordinates use WGS84 lat/lon in degrees.

use serde::Serialize;
use crate::route::Point;

/// Earth radius in meters used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two points in meters.
pub fn haversine(a: &Point, b: &Point) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial bearing from point A to point B in degrees [0, 360).
pub fn bearing(a: &Point, b: &Point) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    let bearing = y.atan2(x).to_degrees();
    (bearing + 360.0) % 360.0
}

/// Length of a polyline in meters.
pub fn path_length(points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine(&w[0], &w[1]))
        .sum()
}

/// One of the eight 45° compass sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Compass {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Compass {
    /// Map a bearing to its sector. Sectors are centered on the
    /// cardinal and diagonal directions, boundaries at 22.5° + k·45°.
    pub fn from_bearing(bearing: f64) -> Self {
        let b = bearing.rem_euclid(360.0);
        if b >= 337.5 || b < 22.5 {
            Compass::North
        } else if b < 67.5 {
            Compass::NorthEast
        } else if b < 112.5 {
            Compass::East
        } else if b < 157.5 {
            Compass::SouthEast
        } else if b < 202.5 {
            Compass::South
        } else if b < 247.5 {
            Compass::SouthWest
        } else if b < 292.5 {
            Compass::West
        } else {
            Compass::NorthWest
        }
    }

    /// Arrow glyph shown on the direction card.
    pub fn icon(self) -> &'static str {
        match self {
            Compass::North => "⬆️",
            Compass::NorthEast => "↗️",
            Compass::East => "➡️",
            Compass::SouthEast => "↘️",
            Compass::South => "⬇️",
            Compass::SouthWest => "↙️",
            Compass::West => "⬅️",
            Compass::NorthWest => "↖️",
        }
    }
}

/// Format a distance for display: whole meters below 1 km,
/// otherwise kilometers with one decimal.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{} m", meters.round() as i64)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

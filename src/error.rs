use crate::position::PositionError;

/// Errors surfaced before or outside of position tracking.
///
/// Position-stream failures during a session are not errors of the
/// tracker; they end up in the display state instead.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("route has no points")]
    EmptyRoute,

    #[error("route point {index} is not a valid coordinate ({lat}, {lon})")]
    InvalidCoordinate { index: usize, lat: f64, lon: f64 },

    #[error("route JSON error: {0}")]
    RouteJson(#[source] serde_json::Error),

    #[error("config JSON error: {0}")]
    ConfigJson(#[source] serde_json::Error),

    #[error("JSON serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("position sample JSON error: {0}")]
    SampleJson(#[source] serde_json::Error),

    #[error("GPX parse error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("GPX file contains no route or track points")]
    NoGeometry,

    #[error("JNI error: {0}")]
    Jni(#[from] jni::errors::Error),

    #[error("position source failed: {0}")]
    Position(#[from] PositionError),
}

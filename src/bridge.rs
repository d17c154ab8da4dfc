//! JSON entry points for platform shells.
//!
//! The Android layer passes routes, samples and config as JSON strings
//! and receives the display state back as JSON. Speech is handed over as
//! a list of utterances the platform engine plays itself.

use serde::Serialize;

use crate::config::TrackerConfig;
use crate::error::NavError;
use crate::position::{PositionError, PositionErrorCode, PositionEvent, PositionSample};
use crate::route::Route;
use crate::session::{NavigationSession, Update};
use crate::tracker::DisplayState;
use crate::voice::{Utterance, VoiceQueue};

pub type BridgeSession = NavigationSession<VoiceQueue>;

#[derive(Debug, Serialize)]
struct BridgeUpdate {
    #[serde(flatten)]
    state: DisplayState,
    show_feedback: bool,
    speech: Vec<Utterance>,
}

/// Start a session from a backend route object and optional config.
pub fn start_navigation(route_json: &str, config_json: Option<&str>) -> Result<BridgeSession, NavError> {
    let route = Route::from_json(route_json)?;
    let config = match config_json {
        Some(json) if !json.trim().is_empty() => TrackerConfig::from_json(json)?,
        _ => TrackerConfig::default(),
    };
    NavigationSession::start(route, config, VoiceQueue::new())
}

pub fn on_position(session: &mut BridgeSession, sample: PositionSample) -> Result<String, NavError> {
    respond(session, Ok(sample))
}

pub fn on_position_json(session: &mut BridgeSession, sample_json: &str) -> Result<String, NavError> {
    let sample: PositionSample = serde_json::from_str(sample_json).map_err(NavError::SampleJson)?;
    on_position(session, sample)
}

/// Report a stream failure using the W3C geolocation error code.
pub fn on_position_error(session: &mut BridgeSession, code: i32, message: &str) -> Result<String, NavError> {
    let error = PositionError::new(PositionErrorCode::from_w3c(code), message);
    respond(session, Err(error))
}

fn respond(session: &mut BridgeSession, event: PositionEvent) -> Result<String, NavError> {
    let Update { state, show_feedback } = session.handle(event);
    let speech = session.narrator_mut().drain();
    serde_json::to_string(&BridgeUpdate {
        state,
        show_feedback,
        speech,
    })
    .map_err(NavError::Serialize)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE: &str = r#"{
        "rank": 1,
        "category": "Safest",
        "safety_score": 72,
        "route": [[0.0, 0.0], [0.0, 0.001], [0.0, 0.002]]
    }"#;

    #[test]
    fn start_with_defaults() {
        let session = start_navigation(ROUTE, None).unwrap();
        assert_eq!(session.tracker().config().arrival_radius_m, 50.0);

        let session = start_navigation(ROUTE, Some("  ")).unwrap();
        assert_eq!(session.tracker().config().off_route_radius_m, 200.0);
    }

    #[test]
    fn start_with_config() {
        let session = start_navigation(ROUTE, Some(r#"{"arrival_radius_m": 10}"#)).unwrap();
        assert_eq!(session.tracker().config().arrival_radius_m, 10.0);
    }

    #[test]
    fn start_rejects_empty_route() {
        assert!(matches!(start_navigation(r#"{"route": []}"#, None), Err(NavError::EmptyRoute)));
    }

    #[test]
    fn position_update_json() {
        let mut session = start_navigation(ROUTE, None).unwrap();
        let json = on_position_json(
            &mut session,
            r#"{"latitude": 0.0, "longitude": 0.001, "accuracyMeters": 20, "timestamp": 0}"#,
        )
        .unwrap();

        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["cursor"], 1);
        assert_eq!(v["accuracy"], "medium");
        assert_eq!(v["safety_band"], "moderate");
        assert_eq!(v["route_color"], "#d97706");
        assert_eq!(v["show_feedback"], false);
        assert_eq!(v["speech"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn arrival_hands_over_speech_once() {
        let mut session = start_navigation(ROUTE, None).unwrap();
        let sample = PositionSample {
            latitude: 0.0,
            longitude: 0.002,
            accuracy_m: 5.0,
            timestamp: 0,
        };

        let v: serde_json::Value = serde_json::from_str(&on_position(&mut session, sample).unwrap()).unwrap();
        assert_eq!(v["arrived"], true);
        assert_eq!(v["speech"][0]["priority"], "high");

        let v: serde_json::Value = serde_json::from_str(&on_position(&mut session, sample).unwrap()).unwrap();
        assert_eq!(v["speech"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn error_update_json() {
        let mut session = start_navigation(ROUTE, None).unwrap();
        let json = on_position_error(&mut session, 1, "User denied Geolocation").unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["position_error"], "User denied Geolocation");
        assert_eq!(v["cursor"], 0);
    }

    #[test]
    fn malformed_sample_is_rejected() {
        let mut session = start_navigation(ROUTE, None).unwrap();
        assert!(matches!(on_position_json(&mut session, "{}"), Err(NavError::SampleJson(_))));
    }
}

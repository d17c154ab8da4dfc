//! Tracker configuration.

use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::position::PositionOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Distance from the final point that counts as arrived, in meters.
    pub arrival_radius_m: f64,
    /// Distance from the route start beyond which the walker is
    /// warned they are not at the starting point, in meters.
    pub off_route_radius_m: f64,
    /// Delay between arrival and the rating prompt, in milliseconds.
    pub feedback_delay_ms: u64,
    pub arrival_announcement: String,
    pub position: PositionOptions,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            arrival_radius_m: 50.0,
            off_route_radius_m: 200.0,
            feedback_delay_ms: 1_000,
            arrival_announcement: "You have arrived at your destination!".to_string(),
            position: PositionOptions::default(),
        }
    }
}

impl TrackerConfig {
    /// Load from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, NavError> {
        serde_json::from_str(json).map_err(NavError::ConfigJson)
    }
}

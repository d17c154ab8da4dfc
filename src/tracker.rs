//! Live progress tracking along a selected route.
//!
//! The tracker turns position samples into the "where am I along this
//! route" view: a progress cursor that only moves forward, the compass
//! direction toward the next point, distance to it, and the arrival and
//! off-route flags. Samples are processed one at a time in arrival order.

use serde::Serialize;

use crate::config::TrackerConfig;
use crate::error::NavError;
use crate::nav::{bearing, format_distance, haversine, path_length, Compass};
use crate::position::{AccuracyLevel, PositionError, PositionErrorCode, PositionSample};
use crate::route::{Point, Route, SafetyBand};
use crate::steps::{plan_steps, NavigationStep};

/// Everything the navigation screen renders.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayState {
    pub cursor: usize,
    pub progress_percent: f64,
    pub direction: Compass,
    pub direction_icon: &'static str,
    pub distance_to_next_m: f64,
    pub distance_to_next: String,
    /// Distance to the destination following the route, in meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_m: Option<f64>,
    pub instruction: String,
    pub arrived: bool,
    pub off_route: bool,
    pub safety_band: SafetyBand,
    pub route_color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<AccuracyLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
}

/// What a single sample changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleOutcome {
    /// Arrival was detected by this sample. Happens at most once.
    pub arrived_now: bool,
    pub cursor_advanced: bool,
}

pub struct NavigationTracker {
    route: Route,
    steps: Vec<NavigationStep>,
    config: TrackerConfig,
    cursor: usize,
    arrived: bool,
    feedback_due_at: Option<u64>,
    state: DisplayState,
}

impl NavigationTracker {
    /// Start tracking a route. Fails if the route has no usable points.
    pub fn new(route: Route, config: TrackerConfig) -> Result<Self, NavError> {
        route.validate()?;

        let steps = plan_steps(&route.points);
        let band = route.safety_band();
        let instruction = steps
            .get(1)
            .unwrap_or(&steps[0])
            .instruction
            .clone();

        let state = DisplayState {
            cursor: 0,
            progress_percent: 0.0,
            direction: Compass::North,
            direction_icon: Compass::North.icon(),
            distance_to_next_m: 0.0,
            distance_to_next: format_distance(0.0),
            remaining_m: None,
            instruction,
            arrived: false,
            off_route: false,
            safety_band: band,
            route_color: band.color(),
            accuracy: None,
            position_error: None,
            position: None,
        };

        log::info!(
            "navigation started: {} points, {:.0} m, category {:?}",
            route.points.len(),
            route.length_m(),
            route.category
        );

        Ok(NavigationTracker {
            route,
            steps,
            config,
            cursor: 0,
            arrived: false,
            feedback_due_at: None,
            state,
        })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn steps(&self) -> &[NavigationStep] {
        &self.steps
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn has_arrived(&self) -> bool {
        self.arrived
    }

    pub fn display(&self) -> &DisplayState {
        &self.state
    }

    /// Process one position sample.
    ///
    /// A fix with non-finite or out-of-range values is recorded as an
    /// unavailable position instead; progress is kept.
    pub fn on_sample(&mut self, sample: &PositionSample) -> SampleOutcome {
        if !sample.is_valid() {
            self.on_error(&PositionError::new(
                PositionErrorCode::PositionUnavailable,
                "Invalid position fix",
            ));
            return SampleOutcome::default();
        }

        let here = sample.point();
        let (Some(origin), Some(destination)) = (self.route.origin(), self.route.destination()) else {
            return SampleOutcome::default();
        };
        let points = &self.route.points;
        let last = points.len() - 1;

        self.state.position = Some(here);
        self.state.accuracy = Some(sample.accuracy_level());
        self.state.position_error = None;
        self.state.off_route = haversine(&here, origin) > self.config.off_route_radius_m;

        let to_end = haversine(&here, destination);
        if to_end < self.config.arrival_radius_m && !self.arrived {
            self.arrived = true;
            self.state.arrived = true;
            self.state.remaining_m = Some(to_end);
            self.feedback_due_at = Some(sample.timestamp.saturating_add(self.config.feedback_delay_ms));
            log::info!("arrived at destination ({:.1} m from final point)", to_end);
            return SampleOutcome {
                arrived_now: true,
                cursor_advanced: false,
            };
        }

        let mut outcome = SampleOutcome::default();

        let nearest = nearest_from(points, self.cursor, &here);
        if nearest > self.cursor {
            log::debug!("cursor advanced {} -> {}", self.cursor, nearest);
            self.cursor = nearest;
            outcome.cursor_advanced = true;

            let target = points.get(nearest + 1).unwrap_or(&points[nearest]);
            let direction = Compass::from_bearing(bearing(&here, target));
            self.state.direction = direction;
            self.state.direction_icon = direction.icon();
        }

        if self.cursor < last {
            let next = &points[self.cursor + 1];
            let dist = haversine(&here, next);
            self.state.distance_to_next_m = dist;
            self.state.distance_to_next = format_distance(dist);
            self.state.remaining_m = Some(dist + path_length(&points[self.cursor + 1..]));
            self.state.instruction = self.steps[self.cursor + 1].instruction_at(dist);
        } else {
            self.state.remaining_m = Some(to_end);
            self.state.instruction = self.steps[last].instruction_at(to_end);
        }

        self.state.cursor = self.cursor;
        self.state.progress_percent = self.progress_percent();

        outcome
    }

    /// Record a position-stream failure. Progress is kept and the next
    /// successful sample clears the error.
    pub fn on_error(&mut self, error: &PositionError) {
        log::warn!("position error ({:?}): {}", error.code, error.message);
        self.state.position_error = Some(error.message.clone());
    }

    /// Share of route points passed, as `cursor / points * 100`.
    pub fn progress_percent(&self) -> f64 {
        self.cursor as f64 * 100.0 / self.route.points.len() as f64
    }

    /// Returns true exactly once, when the post-arrival rating prompt
    /// is due at `now_ms`.
    pub fn take_feedback_prompt(&mut self, now_ms: u64) -> bool {
        match self.feedback_due_at {
            Some(due) if now_ms >= due => {
                self.feedback_due_at = None;
                true
            }
            _ => false,
        }
    }
}

/// Index of the point nearest to `here`, scanning forward from `start`.
/// Ties keep the earliest index.
fn nearest_from(points: &[Point], start: usize, here: &Point) -> usize {
    let mut best = start;
    let mut best_dist = f64::INFINITY;

    for (i, p) in points.iter().enumerate().skip(start) {
        let dist = haversine(here, p);
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }

    best
}

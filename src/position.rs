//! Device position samples and position sources.
//!
//! A [`PositionSource`] delivers samples either once or continuously
//! (watch mode). A watch is held through a [`WatchSubscription`], which
//! clears the watch when dropped so the sensor is released on every exit
//! path.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::Read;

use crate::error::NavError;
use crate::route::{waypoint_point, Point};

/// A single reading from the location sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "accuracyMeters")]
    pub accuracy_m: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl PositionSample {
    pub fn point(&self) -> Point {
        Point {
            lat: self.latitude,
            lon: self.longitude,
        }
    }

    /// Finite coordinates within WGS84 bounds and a finite,
    /// non-negative accuracy.
    pub fn is_valid(&self) -> bool {
        self.point().is_valid() && self.accuracy_m.is_finite() && self.accuracy_m >= 0.0
    }

    pub fn accuracy_level(&self) -> AccuracyLevel {
        AccuracyLevel::from_meters(self.accuracy_m)
    }
}

/// Coarse GPS quality shown by the signal indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyLevel {
    High,
    Medium,
    Low,
}

impl AccuracyLevel {
    pub fn from_meters(accuracy_m: f64) -> Self {
        if accuracy_m <= 10.0 {
            AccuracyLevel::High
        } else if accuracy_m <= 50.0 {
            AccuracyLevel::Medium
        } else {
            AccuracyLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Unsupported,
}

impl PositionErrorCode {
    /// Codes as numbered by the W3C geolocation API; anything else is
    /// treated as unsupported.
    pub fn from_w3c(code: i32) -> Self {
        match code {
            1 => PositionErrorCode::PermissionDenied,
            2 => PositionErrorCode::PositionUnavailable,
            3 => PositionErrorCode::Timeout,
            _ => PositionErrorCode::Unsupported,
        }
    }
}

/// A transient failure reported by the position stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct PositionError {
    pub code: PositionErrorCode,
    pub message: String,
}

impl PositionError {
    pub fn new(code: PositionErrorCode, message: impl Into<String>) -> Self {
        PositionError {
            code,
            message: message.into(),
        }
    }
}

pub type PositionEvent = Result<PositionSample, PositionError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u32,
    pub maximum_age_ms: u32,
}

impl Default for PositionOptions {
    fn default() -> Self {
        PositionOptions {
            enable_high_accuracy: true,
            timeout_ms: 30_000,
            maximum_age_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u32);

/// Anything that can produce device positions.
pub trait PositionSource {
    /// One-shot position fetch.
    fn current_position(&mut self, options: &PositionOptions) -> PositionEvent;

    /// Begin continuous delivery.
    fn watch_position(&mut self, options: &PositionOptions) -> Result<WatchId, PositionError>;

    /// Next event of an active watch, or `None` once the stream ends.
    fn next_event(&mut self, id: WatchId) -> Option<PositionEvent>;

    /// Stop continuous delivery.
    fn clear_watch(&mut self, id: WatchId);
}

impl<T: PositionSource + ?Sized> PositionSource for &mut T {
    fn current_position(&mut self, options: &PositionOptions) -> PositionEvent {
        (**self).current_position(options)
    }

    fn watch_position(&mut self, options: &PositionOptions) -> Result<WatchId, PositionError> {
        (**self).watch_position(options)
    }

    fn next_event(&mut self, id: WatchId) -> Option<PositionEvent> {
        (**self).next_event(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        (**self).clear_watch(id)
    }
}

/// An active watch. Iterating yields position events; dropping it
/// clears the watch.
pub struct WatchSubscription<S: PositionSource> {
    source: S,
    id: WatchId,
}

impl<S: PositionSource> WatchSubscription<S> {
    pub fn acquire(mut source: S, options: &PositionOptions) -> Result<Self, NavError> {
        let id = source.watch_position(options)?;
        log::debug!("position watch {} acquired", id.0);
        Ok(WatchSubscription { source, id })
    }

    pub fn id(&self) -> WatchId {
        self.id
    }
}

impl<S: PositionSource> Iterator for WatchSubscription<S> {
    type Item = PositionEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.next_event(self.id)
    }
}

impl<S: PositionSource> Drop for WatchSubscription<S> {
    fn drop(&mut self) {
        self.source.clear_watch(self.id);
        log::debug!("position watch {} released", self.id.0);
    }
}

/// Plays back a fixed list of events. Used for offline route testing
/// and for replaying recorded GPX tracks.
#[derive(Debug, Default)]
pub struct ReplaySource {
    events: VecDeque<PositionEvent>,
    active: Vec<WatchId>,
    next_id: u32,
}

impl ReplaySource {
    pub fn new(events: impl IntoIterator<Item = PositionEvent>) -> Self {
        ReplaySource {
            events: events.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Replay the first track of a GPX file as samples spaced
    /// `interval_ms` apart, each with the given accuracy.
    pub fn from_gpx_track<R: Read>(reader: R, interval_ms: u64, accuracy_m: f64) -> Result<Self, NavError> {
        let gpx = gpx::read(reader)?;
        let track = gpx.tracks.first().ok_or(NavError::NoGeometry)?;

        let events: Vec<PositionEvent> = track
            .segments
            .iter()
            .flat_map(|seg| seg.points.iter())
            .enumerate()
            .map(|(i, wp)| {
                let p = waypoint_point(wp);
                Ok(PositionSample {
                    latitude: p.lat,
                    longitude: p.lon,
                    accuracy_m,
                    timestamp: i as u64 * interval_ms,
                })
            })
            .collect();

        if events.is_empty() {
            return Err(NavError::NoGeometry);
        }
        Ok(ReplaySource::new(events))
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }

    pub fn active_watches(&self) -> &[WatchId] {
        &self.active
    }
}

impl PositionSource for ReplaySource {
    fn current_position(&mut self, _options: &PositionOptions) -> PositionEvent {
        self.events.pop_front().unwrap_or_else(|| {
            Err(PositionError::new(
                PositionErrorCode::PositionUnavailable,
                "no position available",
            ))
        })
    }

    fn watch_position(&mut self, _options: &PositionOptions) -> Result<WatchId, PositionError> {
        let id = WatchId(self.next_id);
        self.next_id += 1;
        self.active.push(id);
        Ok(id)
    }

    fn next_event(&mut self, id: WatchId) -> Option<PositionEvent> {
        if !self.active.contains(&id) {
            return None;
        }
        self.events.pop_front()
    }

    fn clear_watch(&mut self, id: WatchId) {
        self.active.retain(|w| *w != id);
    }
}

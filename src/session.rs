//! A navigation session: one tracker, one narrator, one position watch.
//!
//! The session is the only place tracker state is mutated. Events are
//! handled to completion one at a time; the position watch is held for
//! the duration of [`NavigationSession::run`] and released on return,
//! including early exit and unwinding.

use serde::Serialize;
use std::ops::ControlFlow;

use crate::config::TrackerConfig;
use crate::error::NavError;
use crate::position::{PositionEvent, PositionSource, WatchSubscription};
use crate::route::Route;
use crate::tracker::{DisplayState, NavigationTracker, SampleOutcome};
use crate::voice::{Narrator, Priority};

/// Result of handling one position event.
#[derive(Debug, Clone, Serialize)]
pub struct Update {
    pub state: DisplayState,
    /// The rating prompt should be shown now.
    pub show_feedback: bool,
}

pub struct NavigationSession<N: Narrator> {
    tracker: NavigationTracker,
    narrator: N,
    feedback_open: bool,
    exited: bool,
}

impl<N: Narrator> NavigationSession<N> {
    pub fn start(route: Route, config: TrackerConfig, narrator: N) -> Result<Self, NavError> {
        let tracker = NavigationTracker::new(route, config)?;
        Ok(NavigationSession {
            tracker,
            narrator,
            feedback_open: false,
            exited: false,
        })
    }

    pub fn tracker(&self) -> &NavigationTracker {
        &self.tracker
    }

    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    pub fn narrator_mut(&mut self) -> &mut N {
        &mut self.narrator
    }

    pub fn is_feedback_open(&self) -> bool {
        self.feedback_open
    }

    pub fn has_exited(&self) -> bool {
        self.exited
    }

    /// Handle one event from the position stream.
    pub fn handle(&mut self, event: PositionEvent) -> Update {
        let mut show_feedback = false;

        match event {
            Ok(sample) => {
                let SampleOutcome { arrived_now, .. } = self.tracker.on_sample(&sample);
                if arrived_now {
                    let text = self.tracker.config().arrival_announcement.clone();
                    self.narrator.speak(&text, Priority::High);
                }
                show_feedback = self.poll_feedback(sample.timestamp);
            }
            Err(error) => self.tracker.on_error(&error),
        }

        Update {
            state: self.tracker.display().clone(),
            show_feedback,
        }
    }

    /// Check the scheduled rating prompt against the clock. Returns true
    /// the first time it is due.
    pub fn poll_feedback(&mut self, now_ms: u64) -> bool {
        if self.tracker.take_feedback_prompt(now_ms) {
            self.feedback_open = true;
            true
        } else {
            false
        }
    }

    /// Open the rating prompt on request, before or after arrival.
    pub fn request_feedback(&mut self) {
        self.feedback_open = true;
    }

    /// Close the rating prompt. Closing it after arrival ends the session.
    pub fn close_feedback(&mut self) {
        self.feedback_open = false;
        if self.tracker.has_arrived() {
            self.exit();
        }
    }

    pub fn exit(&mut self) {
        if !self.exited {
            self.exited = true;
            self.narrator.cancel();
            log::info!(
                "navigation ended at point {} of {} (arrived: {})",
                self.tracker.cursor(),
                self.tracker.route().points.len(),
                self.tracker.has_arrived()
            );
        }
    }

    /// Drive the session from a continuous position watch.
    ///
    /// Runs until the stream ends, `on_update` breaks, or the session is
    /// exited. The watch is cleared before this returns.
    pub fn run<S, F>(&mut self, source: S, mut on_update: F) -> Result<(), NavError>
    where
        S: PositionSource,
        F: FnMut(&mut Self, &Update) -> ControlFlow<()>,
    {
        let options = self.tracker.config().position.clone();
        let subscription = WatchSubscription::acquire(source, &options)?;

        for event in subscription {
            let update = self.handle(event);
            if on_update(self, &update).is_break() || self.exited {
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{PositionError, PositionErrorCode, PositionSample, ReplaySource};
    use crate::route::Point;
    use crate::voice::VoiceQueue;

    fn at(lat: f64, lon: f64, ts: u64) -> PositionEvent {
        Ok(PositionSample {
            latitude: lat,
            longitude: lon,
            accuracy_m: 5.0,
            timestamp: ts,
        })
    }

    fn straight_route() -> Route {
        Route::from_points(vec![
            Point { lat: 0.0, lon: 0.0 },
            Point { lat: 0.0, lon: 0.001 },
            Point { lat: 0.0, lon: 0.002 },
        ])
    }

    fn session() -> NavigationSession<VoiceQueue> {
        NavigationSession::start(straight_route(), TrackerConfig::default(), VoiceQueue::new()).unwrap()
    }

    #[test]
    fn empty_route_does_not_start() {
        let result = NavigationSession::start(Route::default(), TrackerConfig::default(), VoiceQueue::new());
        assert!(matches!(result, Err(NavError::EmptyRoute)));
    }

    #[test]
    fn arrival_is_announced_once_with_high_priority() {
        let mut s = session();
        s.narrator_mut().speak("Head east", Priority::Low);
        s.narrator_mut().start_next();

        s.handle(at(0.0, 0.002, 0));
        s.handle(at(0.0, 0.0021, 500));
        s.handle(at(0.0, 0.002, 900));

        let q = s.narrator();
        assert_eq!(q.interrupted(), 1);
        let pending: Vec<_> = q.pending().collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].text, "You have arrived at your destination!");
        assert_eq!(pending[0].priority, Priority::High);
    }

    #[test]
    fn feedback_prompt_follows_arrival() {
        let mut s = session();

        let u = s.handle(at(0.0, 0.002, 10_000));
        assert!(u.state.arrived);
        assert!(!u.show_feedback);

        let u = s.handle(at(0.0, 0.002, 10_400));
        assert!(!u.show_feedback);

        let u = s.handle(at(0.0, 0.002, 11_000));
        assert!(u.show_feedback);
        assert!(s.is_feedback_open());

        s.close_feedback();
        assert!(s.has_exited());
    }

    #[test]
    fn feedback_prompt_by_clock() {
        let mut s = session();
        s.handle(at(0.0, 0.002, 0));
        assert!(!s.poll_feedback(999));
        assert!(s.poll_feedback(1_000));
        assert!(!s.poll_feedback(2_000));
    }

    #[test]
    fn closing_manual_feedback_before_arrival_keeps_navigating() {
        let mut s = session();
        s.request_feedback();
        assert!(s.is_feedback_open());
        s.close_feedback();
        assert!(!s.has_exited());
    }

    #[test]
    fn error_then_recovery_keeps_cursor() {
        let mut s = session();
        s.handle(at(0.0, 0.001, 0));
        assert_eq!(s.tracker().cursor(), 1);

        let u = s.handle(Err(PositionError::new(PositionErrorCode::Timeout, "Timeout expired")));
        assert_eq!(u.state.position_error.as_deref(), Some("Timeout expired"));
        assert_eq!(u.state.cursor, 1);

        let u = s.handle(at(0.0, 0.0011, 2_000));
        assert!(u.state.position_error.is_none());
        assert_eq!(u.state.cursor, 1);
        assert!((u.state.distance_to_next_m - 100.1).abs() < 0.5);
    }

    #[test]
    fn run_walks_route_and_releases_watch() {
        let mut source = ReplaySource::new(vec![
            at(0.0, 0.0, 0),
            at(0.0, 0.001, 1_000),
            Err(PositionError::new(PositionErrorCode::PositionUnavailable, "Position unavailable")),
            at(0.0, 0.00151, 3_000),
            at(0.0, 0.00199, 4_000),
            at(0.0, 0.002, 5_000),
        ]);

        let mut s = session();
        let mut cursors = Vec::new();
        let mut arrivals = 0;
        s.run(&mut source, |_, u| {
            cursors.push(u.state.cursor);
            if u.state.arrived {
                arrivals += 1;
            }
            ControlFlow::Continue(())
        })
        .unwrap();

        assert_eq!(cursors, vec![0, 1, 1, 2, 2, 2]);
        assert_eq!(arrivals, 2);
        assert!(s.tracker().has_arrived());
        assert_eq!(s.narrator().pending().count(), 1);
        assert!(source.active_watches().is_empty());
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn exit_stops_run_and_releases_watch() {
        let mut source = ReplaySource::new((0..10).map(|i| at(0.0, 0.0, i * 1_000)));

        let mut s = session();
        s.run(&mut source, |session, u| {
            if u.state.position.is_some() {
                session.exit();
            }
            ControlFlow::Continue(())
        })
        .unwrap();

        assert!(s.has_exited());
        assert_eq!(source.remaining(), 9);
        assert!(source.active_watches().is_empty());
    }

    #[test]
    fn break_stops_run() {
        let mut source = ReplaySource::new((0..10).map(|i| at(0.0, 0.0, i * 1_000)));

        let mut s = session();
        s.run(&mut source, |_, _| ControlFlow::Break(())).unwrap();

        assert!(!s.has_exited());
        assert_eq!(source.remaining(), 9);
        assert!(source.active_watches().is_empty());
    }
}

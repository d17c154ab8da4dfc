//! Per-waypoint turn instructions.
//!
//! Classifies the heading change at every interior route point and
//! produces the instruction shown on the direction card while the
//! walker approaches that point.

use serde::Serialize;
use crate::nav::{bearing, format_distance, haversine};
use crate::route::Point;

/// What happens at a route point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Turn {
    Start,
    Straight,
    SlightLeft,
    Left,
    SharpLeft,
    SlightRight,
    Right,
    SharpRight,
    UTurn,
    Arrive,
}

impl Turn {
    pub fn text(self) -> &'static str {
        match self {
            Turn::Start => "Head out",
            Turn::Straight => "Continue straight",
            Turn::SlightLeft => "Keep slightly left",
            Turn::Left => "Turn left",
            Turn::SharpLeft => "Turn sharp left",
            Turn::SlightRight => "Keep slightly right",
            Turn::Right => "Turn right",
            Turn::SharpRight => "Turn sharp right",
            Turn::UTurn => "Make a U-turn",
            Turn::Arrive => "Arrive at destination",
        }
    }
}

/// Instruction attached to one route point.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationStep {
    pub point_index: usize,
    /// Distance from the previous point in meters.
    pub distance_m: f64,
    pub turn: Turn,
    pub instruction: String,
}

impl NavigationStep {
    /// Instruction text for a walker `distance_m` away from this point.
    pub fn instruction_at(&self, distance_m: f64) -> String {
        match self.turn {
            Turn::Start => self.instruction.clone(),
            turn => format!("In {}, {}", format_distance(distance_m), lowercase_first(turn.text())),
        }
    }
}

/// Build one step per route point.
///
/// The first point is `Start`, the last is `Arrive`. A single-point
/// route yields a lone `Arrive` step.
pub fn plan_steps(points: &[Point]) -> Vec<NavigationStep> {
    match points.len() {
        0 => return Vec::new(),
        1 => {
            return vec![NavigationStep {
                point_index: 0,
                distance_m: 0.0,
                turn: Turn::Arrive,
                instruction: Turn::Arrive.text().to_string(),
            }]
        }
        _ => {}
    }

    let last = points.len() - 1;
    let mut steps = Vec::with_capacity(points.len());
    steps.push(NavigationStep {
        point_index: 0,
        distance_m: 0.0,
        turn: Turn::Start,
        instruction: Turn::Start.text().to_string(),
    });

    for (i, w) in points.windows(3).enumerate() {
        let dist = haversine(&w[0], &w[1]);
        let turn = turn_at(&w[0], &w[1], &w[2]);
        steps.push(NavigationStep {
            point_index: i + 1,
            distance_m: dist,
            turn,
            instruction: turn.text().to_string(),
        });
    }

    let dist = haversine(&points[last - 1], &points[last]);
    steps.push(NavigationStep {
        point_index: last,
        distance_m: dist,
        turn: Turn::Arrive,
        instruction: Turn::Arrive.text().to_string(),
    });

    steps
}

/// Turn at B when arriving from A and leaving toward C.
fn turn_at(a: &Point, b: &Point, c: &Point) -> Turn {
    // positive = right, negative = left
    let angle = (bearing(b, c) - bearing(a, b) + 540.0).rem_euclid(360.0) - 180.0;
    classify_turn(angle)
}

fn classify_turn(angle: f64) -> Turn {
    let abs_angle = angle.abs();

    if abs_angle > 170.0 {
        Turn::UTurn
    } else if abs_angle > 120.0 {
        if angle > 0.0 { Turn::SharpRight } else { Turn::SharpLeft }
    } else if abs_angle > 60.0 {
        if angle > 0.0 { Turn::Right } else { Turn::Left }
    } else if abs_angle > 20.0 {
        if angle > 0.0 { Turn::SlightRight } else { Turn::SlightLeft }
    } else {
        Turn::Straight
    }
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

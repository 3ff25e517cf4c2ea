// src/steering/estimator.rs
//
// Raw steering angle from the current frame's lane geometry.

use crate::types::Lane;
use serde::Serialize;
use tracing::debug;

pub const STRAIGHT_ANGLE: i32 = 90;

/// Legacy numeric stand-in for "no lane detected". Outside any servo angle.
pub const NO_DETECTION_SENTINEL: i32 = -90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RawSteering {
    NoDetection,
    Angle(i32),
}

impl RawSteering {
    pub fn as_degrees(&self) -> i32 {
        match self {
            Self::NoDetection => NO_DETECTION_SENTINEL,
            Self::Angle(deg) => *deg,
        }
    }

    pub fn is_detection(&self) -> bool {
        matches!(self, Self::Angle(_))
    }
}

/// Horizontal offset of the heading target from the car, in pixels.
///
/// One lane: the lane's own lean (far x minus near x).
/// Two lanes: midpoint of the far endpoints relative to the frame center.
pub fn heading_offset(width: i32, lanes: &[Lane]) -> Option<f64> {
    match lanes {
        [] => None,
        [lane] => Some((lane.segment.x2 - lane.segment.x1) as f64),
        [left, right, ..] => {
            let mid = width / 2;
            Some((left.segment.x2 + right.segment.x2) as f64 / 2.0 - mid as f64)
        }
    }
}

/// 90 = straight, < 90 = left, > 90 = right.
pub fn compute_steering_angle(width: i32, height: i32, lanes: &[Lane]) -> RawSteering {
    let Some(x_offset) = heading_offset(width, lanes) else {
        return RawSteering::NoDetection;
    };
    let y_offset = (height / 2) as f64;

    let angle_to_mid_deg = (x_offset / y_offset).atan().to_degrees().round() as i32;
    let steering_angle = angle_to_mid_deg + STRAIGHT_ANGLE;

    debug!(
        "x_offset={:.1} y_offset={:.1} -> raw angle {}",
        x_offset, y_offset, steering_angle
    );
    RawSteering::Angle(steering_angle)
}

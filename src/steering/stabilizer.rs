// src/steering/stabilizer.rs
//
// Slew-rate limiter on the steering command. Holds the only state that
// survives between frames.

use super::estimator::{RawSteering, STRAIGHT_ANGLE};
use crate::types::SteeringConfig;
use tracing::info;

pub struct SteeringStabilizer {
    current: i32,
    max_deviation_two_lanes: i32,
    max_deviation_one_lane: i32,
}

impl SteeringStabilizer {
    pub fn new(config: &SteeringConfig) -> Self {
        Self {
            current: STRAIGHT_ANGLE,
            max_deviation_two_lanes: config.max_deviation_two_lanes,
            max_deviation_one_lane: config.max_deviation_one_lane,
        }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    /// Largest step allowed for a frame that used `num_lanes` lane lines.
    pub fn max_deviation(&self, num_lanes: usize) -> i32 {
        if num_lanes == 2 {
            self.max_deviation_two_lanes
        } else {
            self.max_deviation_one_lane
        }
    }

    /// Moves towards `raw` by at most `max_deviation(num_lanes)` degrees.
    /// `NoDetection` holds the previous angle.
    pub fn stabilize(&mut self, raw: RawSteering, num_lanes: usize) -> i32 {
        match raw {
            RawSteering::NoDetection => self.current,
            RawSteering::Angle(new) => {
                let bound = self.max_deviation(num_lanes);
                self.stabilize_with_bound(new, bound)
            }
        }
    }

    pub fn stabilize_with_bound(&mut self, new_angle: i32, max_deviation: i32) -> i32 {
        let deviation = new_angle - self.current;
        let stabilized = if deviation.abs() > max_deviation {
            self.current + max_deviation * deviation.signum()
        } else {
            new_angle
        };

        info!(
            "Calculated angle: {}°, stabilized angle: {}°",
            new_angle, stabilized
        );
        self.current = stabilized;
        stabilized
    }

    pub fn reset(&mut self) {
        self.current = STRAIGHT_ANGLE;
    }
}

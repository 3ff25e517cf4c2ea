// src/steering/mod.rs

pub mod actuator;
pub mod estimator;
pub mod stabilizer;

pub use actuator::{ClampedActuator, LoggingActuator, SteeringActuator};
pub use estimator::{compute_steering_angle, RawSteering, STRAIGHT_ANGLE};
pub use stabilizer::SteeringStabilizer;

use serde::Serialize;

/// What a steering producer decided for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SteeringDecision {
    pub raw: RawSteering,
    /// Stabilized angle, the value sent to the actuator.
    pub angle: i32,
    /// Lane lines behind `raw`; 0 for producers that do not detect lanes.
    pub lanes_used: usize,
}

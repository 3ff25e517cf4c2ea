// src/steering/actuator.rs
//
// Hardware boundary. The steering pipeline only returns angles; whatever
// turns the wheels implements `SteeringActuator`.

use crate::types::ServoConfig;
use anyhow::Result;
use tracing::{debug, warn};

pub trait SteeringActuator {
    fn set_steering_angle(&mut self, degrees: i32) -> Result<()>;
}

/// Records and logs commands instead of driving a servo.
#[derive(Debug, Default)]
pub struct LoggingActuator {
    last_angle: Option<i32>,
    commands: u64,
}

impl LoggingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_angle(&self) -> Option<i32> {
        self.last_angle
    }

    pub fn commands(&self) -> u64 {
        self.commands
    }
}

impl SteeringActuator for LoggingActuator {
    fn set_steering_angle(&mut self, degrees: i32) -> Result<()> {
        debug!("Steering servo -> {}°", degrees);
        self.last_angle = Some(degrees);
        self.commands += 1;
        Ok(())
    }
}

/// Keeps commands inside the servo's mechanical range before delegating.
pub struct ClampedActuator<A> {
    inner: A,
    min_angle: i32,
    max_angle: i32,
}

impl<A: SteeringActuator> ClampedActuator<A> {
    pub fn new(inner: A, servo: &ServoConfig) -> Self {
        Self {
            inner,
            min_angle: servo.min_angle,
            max_angle: servo.max_angle,
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: SteeringActuator> SteeringActuator for ClampedActuator<A> {
    fn set_steering_angle(&mut self, degrees: i32) -> Result<()> {
        let clamped = degrees.clamp(self.min_angle, self.max_angle);
        if clamped != degrees {
            warn!(
                "Steering angle {}° outside servo range [{}, {}], clamped to {}°",
                degrees, self.min_angle, self.max_angle, clamped
            );
        }
        self.inner.set_steering_angle(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_actuator_records_last_command() {
        let mut act = LoggingActuator::new();
        assert_eq!(act.last_angle(), None);
        act.set_steering_angle(95).unwrap();
        act.set_steering_angle(97).unwrap();
        assert_eq!(act.last_angle(), Some(97));
        assert_eq!(act.commands(), 2);
    }

    #[test]
    fn test_clamped_actuator_limits_range() {
        let mut act = ClampedActuator::new(LoggingActuator::new(), &ServoConfig::default());

        act.set_steering_angle(170).unwrap();
        assert_eq!(act.inner().last_angle(), Some(135));

        act.set_steering_angle(10).unwrap();
        assert_eq!(act.inner().last_angle(), Some(45));

        act.set_steering_angle(100).unwrap();
        assert_eq!(act.inner().last_angle(), Some(100));
    }
}

// src/follower.rs
//
// Per-frame steering producers. Each one owns its stabilizer state and
// returns a decision; none of them touches hardware.

use crate::steering::{compute_steering_angle, SteeringDecision, SteeringStabilizer};
use crate::types::{Config, Frame, Lane, LineSegment};
use crate::vision::{self, LaneDetection};
use anyhow::Result;
use opencv::{core::Mat, prelude::*};
use tracing::{debug, warn};

pub trait SteeringSource {
    fn name(&self) -> &'static str;

    /// Steering decision for one frame.
    fn steer(&mut self, frame: &Frame) -> Result<SteeringDecision>;

    /// Angle last handed out, 90 before the first frame.
    fn current_angle(&self) -> i32;

    /// Lane geometry behind the last decision, if the producer has any.
    fn last_detection(&self) -> Option<&LaneDetection> {
        None
    }

    /// Forgets per-stream state before a new recording starts.
    fn reset(&mut self);
}

#[derive(Debug, Clone)]
pub struct FollowResult {
    pub segments: Vec<LineSegment>,
    pub lanes: Vec<Lane>,
    pub decision: SteeringDecision,
}

/// Classical color → edges → Hough → lane fit → angle follower.
pub struct HandCodedLaneFollower {
    config: Config,
    stabilizer: SteeringStabilizer,
    last_detection: Option<LaneDetection>,
}

impl HandCodedLaneFollower {
    pub fn new(config: Config) -> Self {
        let stabilizer = SteeringStabilizer::new(&config.steering);
        Self {
            config,
            stabilizer,
            last_detection: None,
        }
    }

    pub fn follow_frame(&mut self, frame: &Frame) -> Result<FollowResult> {
        self.last_detection = None;
        let mat = vision::frame_to_mat(frame)?;
        self.follow_lane(&mat)
    }

    pub fn follow_lane(&mut self, bgr: &Mat) -> Result<FollowResult> {
        // A failed frame must not leave the previous lanes behind
        self.last_detection = None;
        let detection = vision::detect_lane(bgr, &self.config)?;
        let lanes_used = detection.lanes.len();

        let raw = compute_steering_angle(bgr.cols(), bgr.rows(), &detection.lanes);
        if lanes_used == 0 {
            warn!("No lane lines detected, holding heading");
        }
        let angle = self.stabilizer.stabilize(raw, lanes_used);
        debug!("Lanes: {} raw: {:?} angle: {}", lanes_used, raw, angle);

        let result = FollowResult {
            segments: detection.segments.clone(),
            lanes: detection.lanes.clone(),
            decision: SteeringDecision {
                raw,
                angle,
                lanes_used,
            },
        };
        self.last_detection = Some(detection);
        Ok(result)
    }
}

impl SteeringSource for HandCodedLaneFollower {
    fn name(&self) -> &'static str {
        "handcoded"
    }

    fn steer(&mut self, frame: &Frame) -> Result<SteeringDecision> {
        Ok(self.follow_frame(frame)?.decision)
    }

    fn current_angle(&self) -> i32 {
        self.stabilizer.current()
    }

    fn last_detection(&self) -> Option<&LaneDetection> {
        self.last_detection.as_ref()
    }

    fn reset(&mut self) {
        self.stabilizer.reset();
        self.last_detection = None;
    }
}

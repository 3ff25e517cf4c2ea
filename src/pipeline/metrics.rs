// src/pipeline/metrics.rs
//
// Per-run counters. Atomics so a diagnostics reader can share them with
// the driving loop.

use crate::steering::SteeringDecision;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct DriveMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub frames_two_lanes: Arc<AtomicU64>,
    pub frames_one_lane: Arc<AtomicU64>,
    pub frames_no_detection: Arc<AtomicU64>,
    pub frames_model: Arc<AtomicU64>,
    pub steering_failures: Arc<AtomicU64>,
    pub actuator_failures: Arc<AtomicU64>,
    pub overlay_failures: Arc<AtomicU64>,
    pub recorder_failures: Arc<AtomicU64>,
    pub frame_time_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for DriveMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DriveMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            frames_two_lanes: Arc::new(AtomicU64::new(0)),
            frames_one_lane: Arc::new(AtomicU64::new(0)),
            frames_no_detection: Arc::new(AtomicU64::new(0)),
            frames_model: Arc::new(AtomicU64::new(0)),
            steering_failures: Arc::new(AtomicU64::new(0)),
            actuator_failures: Arc::new(AtomicU64::new(0)),
            overlay_failures: Arc::new(AtomicU64::new(0)),
            recorder_failures: Arc::new(AtomicU64::new(0)),
            frame_time_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_timing(&self, counter: &AtomicU64, duration_us: u64) {
        counter.store(duration_us, Ordering::Relaxed);
    }

    /// Counts a frame into exactly one bucket. Angles not backed by lane
    /// lines (the network follower) land in `frames_model`.
    pub fn record_decision(&self, decision: &SteeringDecision) {
        self.inc(&self.total_frames);
        let bucket = match (decision.raw.is_detection(), decision.lanes_used) {
            (false, _) => &self.frames_no_detection,
            (true, 0) => &self.frames_model,
            (true, 1) => &self.frames_one_lane,
            (true, _) => &self.frames_two_lanes,
        };
        self.inc(bucket);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames.load(Ordering::Relaxed),
            fps: self.fps(),
            frames_two_lanes: self.frames_two_lanes.load(Ordering::Relaxed),
            frames_one_lane: self.frames_one_lane.load(Ordering::Relaxed),
            frames_no_detection: self.frames_no_detection.load(Ordering::Relaxed),
            frames_model: self.frames_model.load(Ordering::Relaxed),
            steering_failures: self.steering_failures.load(Ordering::Relaxed),
            actuator_failures: self.actuator_failures.load(Ordering::Relaxed),
            overlay_failures: self.overlay_failures.load(Ordering::Relaxed),
            recorder_failures: self.recorder_failures.load(Ordering::Relaxed),
            last_frame_us: self.frame_time_us.load(Ordering::Relaxed),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub fps: f64,
    pub frames_two_lanes: u64,
    pub frames_one_lane: u64,
    pub frames_no_detection: u64,
    pub frames_model: u64,
    pub steering_failures: u64,
    pub actuator_failures: u64,
    pub overlay_failures: u64,
    pub recorder_failures: u64,
    pub last_frame_us: u64,
    pub elapsed_secs: f64,
}

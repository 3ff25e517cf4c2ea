// src/pipeline/driver.rs
//
// Frame-at-a-time driving loop:
//
//   FrameSource → SteeringSource → SteeringActuator
//                              └→ overlay video / frame recorder / metrics
//
// Every frame runs to completion before the next one is read. Only a
// failing frame source ends the loop early; steering, actuator, overlay and
// recorder failures are logged, counted and skipped.

use super::metrics::{DriveMetrics, MetricsSummary};
use crate::follower::SteeringSource;
use crate::overlay::render_drive_overlay;
use crate::recorder::FrameRecorder;
use crate::steering::{RawSteering, SteeringActuator, SteeringDecision};
use crate::types::{Config, Frame, Lane, LineSegment};
use crate::video_processor::{FrameSource, OverlaySink};
use crate::vision::frame_to_mat;
use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

const PROGRESS_LOG_INTERVAL: u64 = 100;

pub struct Driver<A: SteeringActuator> {
    config: Config,
    actuator: A,
    overlay_sink: Option<Box<dyn OverlaySink>>,
    recorder: Option<FrameRecorder>,
    metrics: DriveMetrics,
}

impl<A: SteeringActuator> Driver<A> {
    pub fn new(config: Config, actuator: A) -> Self {
        Self {
            config,
            actuator,
            overlay_sink: None,
            recorder: None,
            metrics: DriveMetrics::new(),
        }
    }

    pub fn with_overlay_sink<S: OverlaySink + 'static>(mut self, sink: Option<S>) -> Self {
        self.overlay_sink = sink.map(|s| Box::new(s) as Box<dyn OverlaySink>);
        self
    }

    pub fn with_recorder(mut self, recorder: Option<FrameRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn summary(&self) -> MetricsSummary {
        self.metrics.summary()
    }

    /// Runs until the source is exhausted or `video.max_frames` is reached.
    pub fn run(
        &mut self,
        steering: &mut dyn SteeringSource,
        frames: &mut dyn FrameSource,
    ) -> Result<MetricsSummary> {
        info!("Driving with the {} steering source", steering.name());
        let mut index: u64 = 0;

        loop {
            if let Some(max) = self.config.video.max_frames {
                if index >= max {
                    info!("Reached max_frames={}, stopping", max);
                    break;
                }
            }
            let Some(frame) = frames.next_frame()? else {
                break;
            };

            let decision = self.step(steering, &frame, index);
            index += 1;

            if index % PROGRESS_LOG_INTERVAL == 0 {
                info!(
                    "Frame {}: angle {}° ({} lane(s)), {:.1} FPS",
                    index,
                    decision.angle,
                    decision.lanes_used,
                    self.metrics.fps()
                );
            }
        }

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.flush()?;
            info!(
                "💾 {} frame(s) recorded to {}",
                recorder.frames_written(),
                recorder.output_dir().display()
            );
        }
        Ok(self.summary())
    }

    /// Processes one frame and returns the angle sent to the actuator.
    pub fn step(
        &mut self,
        steering: &mut dyn SteeringSource,
        frame: &Frame,
        index: u64,
    ) -> SteeringDecision {
        let started = Instant::now();

        let decision = match steering.steer(frame) {
            Ok(decision) => decision,
            Err(e) => {
                warn!("Frame {}: steering failed ({:#}), holding heading", index, e);
                self.metrics.inc(&self.metrics.steering_failures);
                SteeringDecision {
                    raw: RawSteering::NoDetection,
                    angle: steering.current_angle(),
                    lanes_used: 0,
                }
            }
        };
        self.metrics.record_decision(&decision);

        if let Err(e) = self.actuator.set_steering_angle(decision.angle) {
            warn!("Frame {}: actuator rejected {}°: {:#}", index, decision.angle, e);
            self.metrics.inc(&self.metrics.actuator_failures);
        }

        if self.overlay_sink.is_some() || self.recorder.is_some() {
            self.emit_diagnostics(steering, frame, index, &decision);
        }

        self.metrics
            .set_timing(&self.metrics.frame_time_us, started.elapsed().as_micros() as u64);
        decision
    }

    fn emit_diagnostics(
        &mut self,
        steering: &dyn SteeringSource,
        frame: &Frame,
        index: u64,
        decision: &SteeringDecision,
    ) {
        let mat = match frame_to_mat(frame) {
            Ok(mat) => mat,
            Err(e) => {
                warn!("Frame {}: cannot convert frame for diagnostics: {:#}", index, e);
                self.metrics.inc(&self.metrics.overlay_failures);
                return;
            }
        };

        if self.config.overlay.enabled {
            if let Some(sink) = self.overlay_sink.as_mut() {
                let (segments, lanes): (&[LineSegment], &[Lane]) = match steering.last_detection() {
                    Some(detection) => (&detection.segments, &detection.lanes),
                    None => (&[], &[]),
                };

                let written = render_drive_overlay(
                    &mat,
                    segments,
                    lanes,
                    decision.angle,
                    &self.config.overlay,
                )
                .and_then(|overlay| sink.write_overlay(&overlay));

                if let Err(e) = written {
                    warn!("Frame {}: overlay failed: {:#}", index, e);
                    self.metrics.inc(&self.metrics.overlay_failures);
                }
            }
        }

        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(e) = recorder.record(&mat, index, frame.timestamp_ms, decision) {
                warn!("Frame {}: recording failed: {:#}", index, e);
                self.metrics.inc(&self.metrics.recorder_failures);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::follower::HandCodedLaneFollower;
    use crate::steering::{ClampedActuator, LoggingActuator};
    use crate::types::RecordingConfig;
    use crate::vision::mat_to_frame;
    use crate::vision::test_frames::{blank, symmetric_track};
    use opencv::{core::Mat, prelude::*};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    struct QueuedFrames(VecDeque<Frame>);

    impl FrameSource for QueuedFrames {
        fn next_frame(&mut self) -> Result<Option<Frame>> {
            Ok(self.0.pop_front())
        }
    }

    struct BrokenSteering;

    impl SteeringSource for BrokenSteering {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn steer(&mut self, _frame: &Frame) -> Result<SteeringDecision> {
            anyhow::bail!("no model")
        }

        fn current_angle(&self) -> i32 {
            90
        }

        fn reset(&mut self) {}
    }

    /// Counts pulls so tests can see how far the driver read.
    struct CountingFrames {
        inner: QueuedFrames,
        pulls: usize,
    }

    impl FrameSource for CountingFrames {
        fn next_frame(&mut self) -> Result<Option<Frame>> {
            self.pulls += 1;
            self.inner.next_frame()
        }
    }

    /// Keeps the size of every overlay it is handed, optionally failing.
    struct SharedSink {
        sizes: Rc<RefCell<Vec<(i32, i32)>>>,
        fail: bool,
    }

    impl OverlaySink for SharedSink {
        fn write_overlay(&mut self, frame: &Mat) -> Result<()> {
            self.sizes.borrow_mut().push((frame.cols(), frame.rows()));
            if self.fail {
                anyhow::bail!("disk full");
            }
            Ok(())
        }
    }

    struct FailingActuator;

    impl SteeringActuator for FailingActuator {
        fn set_steering_angle(&mut self, _degrees: i32) -> Result<()> {
            anyhow::bail!("servo unplugged")
        }
    }

    fn frames(track: usize, empty: usize) -> QueuedFrames {
        let mut queue = VecDeque::new();
        for i in 0..track {
            queue.push_back(mat_to_frame(&symmetric_track(), i as f64 * 50.0).unwrap());
        }
        for i in 0..empty {
            queue.push_back(mat_to_frame(&blank(320, 240), (track + i) as f64 * 50.0).unwrap());
        }
        QueuedFrames(queue)
    }

    fn actuator() -> ClampedActuator<LoggingActuator> {
        ClampedActuator::new(LoggingActuator::new(), &Config::default().servo)
    }

    #[test]
    fn test_run_counts_frames_and_actuates() {
        let config = Config::default();
        let mut follower = HandCodedLaneFollower::new(config.clone());
        let mut driver = Driver::new(config, actuator());

        let summary = driver.run(&mut follower, &mut frames(3, 2)).unwrap();

        assert_eq!(summary.total_frames, 5);
        assert_eq!(summary.frames_two_lanes, 3);
        assert_eq!(summary.frames_no_detection, 2);
        assert_eq!(driver.actuator().inner().commands(), 5);

        let last = driver.actuator().inner().last_angle().unwrap();
        assert!((85..=95).contains(&last));
    }

    #[test]
    fn test_max_frames_stops_early() {
        let mut config = Config::default();
        config.video.max_frames = Some(2);
        let mut follower = HandCodedLaneFollower::new(config.clone());
        let mut driver = Driver::new(config, actuator());

        let mut source = CountingFrames {
            inner: frames(0, 5),
            pulls: 0,
        };
        let summary = driver.run(&mut follower, &mut source).unwrap();
        assert_eq!(summary.total_frames, 2);
        assert_eq!(source.pulls, 2);
        assert_eq!(source.inner.0.len(), 3);
    }

    #[test]
    fn test_overlay_sink_gets_every_frame() {
        let sizes = Rc::new(RefCell::new(Vec::new()));
        let sink = SharedSink {
            sizes: Rc::clone(&sizes),
            fail: false,
        };
        let config = Config::default();
        let mut follower = HandCodedLaneFollower::new(config.clone());
        let mut driver = Driver::new(config, actuator()).with_overlay_sink(Some(sink));

        let summary = driver.run(&mut follower, &mut frames(2, 1)).unwrap();

        assert_eq!(summary.overlay_failures, 0);
        assert_eq!(*sizes.borrow(), vec![(320, 240); 3]);
    }

    #[test]
    fn test_overlay_failure_keeps_steering() {
        let track = frames(3, 1).0;

        let config = Config::default();
        let mut plain_follower = HandCodedLaneFollower::new(config.clone());
        let mut plain = Driver::new(config.clone(), actuator());
        let expected: Vec<SteeringDecision> = track
            .iter()
            .enumerate()
            .map(|(i, f)| plain.step(&mut plain_follower, f, i as u64))
            .collect();

        let sizes = Rc::new(RefCell::new(Vec::new()));
        let sink = SharedSink {
            sizes: Rc::clone(&sizes),
            fail: true,
        };
        let mut follower = HandCodedLaneFollower::new(config.clone());
        let mut driver = Driver::new(config, actuator()).with_overlay_sink(Some(sink));
        let decisions: Vec<SteeringDecision> = track
            .iter()
            .enumerate()
            .map(|(i, f)| driver.step(&mut follower, f, i as u64))
            .collect();

        assert_eq!(decisions, expected);
        assert_eq!(driver.actuator().inner().commands(), 4);
        assert_eq!(
            driver.actuator().inner().last_angle(),
            expected.last().map(|d| d.angle)
        );
        assert_eq!(sizes.borrow().len(), 4);

        let summary = driver.summary();
        assert_eq!(summary.overlay_failures, 4);
        assert_eq!(summary.total_frames, 4);
    }

    #[test]
    fn test_steering_failure_holds_heading() {
        let mut driver = Driver::new(Config::default(), actuator());
        let summary = driver.run(&mut BrokenSteering, &mut frames(0, 2)).unwrap();

        assert_eq!(summary.steering_failures, 2);
        assert_eq!(summary.frames_no_detection, 2);
        assert_eq!(driver.actuator().inner().last_angle(), Some(90));
    }

    #[test]
    fn test_actuator_failure_is_not_fatal() {
        let config = Config::default();
        let mut follower = HandCodedLaneFollower::new(config.clone());
        let mut driver = Driver::new(config, FailingActuator);

        let summary = driver.run(&mut follower, &mut frames(1, 1)).unwrap();
        assert_eq!(summary.total_frames, 2);
        assert_eq!(summary.actuator_failures, 2);
    }

    #[test]
    fn test_recorder_receives_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let recording = RecordingConfig {
            enabled: true,
            output_dir: dir.path().to_string_lossy().to_string(),
        };
        let recorder = FrameRecorder::new(&recording, "drive").unwrap();

        let config = Config::default();
        let mut follower = HandCodedLaneFollower::new(config.clone());
        let mut driver = Driver::new(config, actuator()).with_recorder(Some(recorder));

        driver.run(&mut follower, &mut frames(1, 2)).unwrap();

        let pngs = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map(|x| x == "png").unwrap_or(false))
            .count();
        assert_eq!(pngs, 3);
        let log = std::fs::read_to_string(dir.path().join("drive_steering.jsonl")).unwrap();
        assert_eq!(log.lines().count(), 3);
    }
}

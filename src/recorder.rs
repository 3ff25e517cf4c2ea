// src/recorder.rs
//
// Driving-frame logger. Every raw frame is stored as a PNG whose name
// carries the steering label, `<prefix>_<index>_<angle>.png`, next to a
// JSONL log with one steering record per frame.

use crate::steering::SteeringDecision;
use crate::types::RecordingConfig;
use anyhow::{Context, Result};
use opencv::{core::Mat, core::Vector, imgcodecs};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct SteeringRecord {
    pub frame: u64,
    pub timestamp_ms: f64,
    pub raw_angle: i32,
    pub angle: i32,
    pub lanes: usize,
    pub image: String,
}

pub struct FrameRecorder {
    output_dir: PathBuf,
    prefix: String,
    log: BufWriter<File>,
    frames_written: u64,
}

impl FrameRecorder {
    pub fn new(config: &RecordingConfig, prefix: &str) -> Result<Self> {
        let output_dir = PathBuf::from(&config.output_dir);
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let log_path = output_dir.join(format!("{}_steering.jsonl", prefix));
        let log = BufWriter::new(
            File::create(&log_path)
                .with_context(|| format!("Failed to create {}", log_path.display()))?,
        );
        info!("💾 Recording frames to {}", output_dir.display());

        Ok(Self {
            output_dir,
            prefix: prefix.to_string(),
            log,
            frames_written: 0,
        })
    }

    /// Prefix for live sessions, e.g. `car-video-261017-142503`.
    pub fn session_prefix() -> String {
        format!("car-video-{}", chrono::Local::now().format("%y%m%d-%H%M%S"))
    }

    pub fn image_name(&self, index: u64, angle: i32) -> String {
        format!("{}_{:03}_{}.png", self.prefix, index, angle)
    }

    pub fn record(
        &mut self,
        frame: &Mat,
        index: u64,
        timestamp_ms: f64,
        decision: &SteeringDecision,
    ) -> Result<PathBuf> {
        let name = self.image_name(index, decision.angle);
        let path = self.output_dir.join(&name);

        let written = imgcodecs::imwrite(&path.to_string_lossy(), frame, &Vector::new())?;
        if !written {
            anyhow::bail!("imwrite refused {}", path.display());
        }

        let record = SteeringRecord {
            frame: index,
            timestamp_ms,
            raw_angle: decision.raw.as_degrees(),
            angle: decision.angle,
            lanes: decision.lanes_used,
            image: name,
        };
        serde_json::to_writer(&mut self.log, &record)?;
        self.log.write_all(b"\n")?;

        self.frames_written += 1;
        Ok(path)
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn flush(&mut self) -> Result<()> {
        self.log.flush()?;
        Ok(())
    }
}

// src/video_processor.rs

use crate::types::{Frame, VideoConfig};
use crate::vision::mat_to_frame;
use anyhow::{Context, Result};
use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTraitConst, VideoWriter, VideoWriterTrait},
};
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Anything that yields frames one at a time, `None` at end of stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Destination for rendered overlay frames.
pub trait OverlaySink {
    fn write_overlay(&mut self, frame: &Mat) -> Result<()>;
}

impl OverlaySink for VideoWriter {
    fn write_overlay(&mut self, frame: &Mat) -> Result<()> {
        VideoWriterTrait::write(self, frame)?;
        Ok(())
    }
}

const VIDEO_EXTENSIONS: [&str; 4] = ["avi", "mp4", "mov", "mkv"];

/// Recordings below `input`, or `input` itself when it is a file.
pub fn find_video_files(input: &str) -> Result<Vec<PathBuf>> {
    let root = Path::new(input);
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut videos: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    videos.sort();

    info!("Found {} video files", videos.len());
    Ok(videos)
}

pub struct VideoSource {
    cap: VideoCapture,
    pub fps: f64,
    pub width: i32,
    pub height: i32,
    pub current_frame: u64,
    /// Stem used to name outputs: the file stem, or `camera<N>`.
    pub name: String,
}

impl VideoSource {
    pub fn open_file(path: &Path) -> Result<Self> {
        info!("Opening video: {}", path.display());

        let path_str = path
            .to_str()
            .with_context(|| format!("Non UTF-8 video path {}", path.display()))?;
        let cap = VideoCapture::from_file(path_str, videoio::CAP_ANY)?;
        if !cap.is_opened()? {
            anyhow::bail!("Failed to open video file {}", path.display());
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("video")
            .to_string();
        Self::from_capture(cap, name, None)
    }

    pub fn open_camera(index: i32, config: &VideoConfig) -> Result<Self> {
        info!("Opening camera {}", index);

        let mut cap = VideoCapture::new(index, videoio::CAP_ANY)?;
        if !cap.is_opened()? {
            anyhow::bail!("Failed to open camera {}", index);
        }
        cap.set(videoio::CAP_PROP_FRAME_WIDTH, config.width as f64)?;
        cap.set(videoio::CAP_PROP_FRAME_HEIGHT, config.height as f64)?;

        Self::from_capture(cap, format!("camera{}", index), Some(config.fps))
    }

    fn from_capture(cap: VideoCapture, name: String, fallback_fps: Option<f64>) -> Result<Self> {
        let reported_fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS)?;
        let fps = if reported_fps > 0.0 {
            reported_fps
        } else {
            fallback_fps.unwrap_or(20.0)
        };
        let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT)? as i32;

        info!("Video properties: {}x{} @ {:.1} FPS", width, height, fps);

        Ok(Self {
            cap,
            fps,
            width,
            height,
            current_frame: 0,
            name,
        })
    }

    /// Reads the next BGR frame as a matrix. `None` at end of stream.
    pub fn read_mat(&mut self) -> Result<Option<Mat>> {
        use opencv::videoio::VideoCaptureTrait;

        let mut mat = Mat::default();
        if !VideoCaptureTrait::read(&mut self.cap, &mut mat)? || mat.empty() {
            return Ok(None);
        }
        self.current_frame += 1;
        Ok(Some(mat))
    }

    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        let Some(mat) = self.read_mat()? else {
            return Ok(None);
        };
        let timestamp_ms = (self.current_frame as f64 / self.fps) * 1000.0;
        Ok(Some(mat_to_frame(&mat, timestamp_ms)?))
    }

    /// Drops the first frames of a stream (camera exposure settling).
    pub fn skip_frames(&mut self, count: usize) -> Result<usize> {
        let mut skipped = 0;
        while skipped < count && self.read_mat()?.is_some() {
            skipped += 1;
        }
        Ok(skipped)
    }
}

impl FrameSource for VideoSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        self.read_frame()
    }
}

/// XVID writer for `<output_dir>/<name>_overlay.avi`, or `None` when disabled.
pub fn create_overlay_writer(
    config: &VideoConfig,
    name: &str,
    width: i32,
    height: i32,
    fps: f64,
) -> Result<Option<VideoWriter>> {
    if !config.save_overlay {
        return Ok(None);
    }

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create {}", config.output_dir))?;
    let output_path = PathBuf::from(&config.output_dir).join(format!("{}_overlay.avi", name));
    info!("Output video: {}", output_path.display());

    let fourcc = VideoWriter::fourcc('X', 'V', 'I', 'D')?;
    let writer = VideoWriter::new(
        &output_path.to_string_lossy(),
        fourcc,
        fps,
        core::Size::new(width, height),
        true,
    )?;

    Ok(Some(writer))
}

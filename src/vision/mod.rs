// src/vision/mod.rs
//
// Classical lane detection.
//
// Signal flow:
//   BGR Frame → color_mask → edges::detect_edges → edges::crop_top
//             → segments::detect_segments → segments::discard_degenerate
//             → lane_aggregator → 0..=2 Lanes

pub mod color_mask;
pub mod edges;
pub mod lane_aggregator;
pub mod segments;

pub use lane_aggregator::{LaneAggregator, LineFit};

use crate::types::{Config, Frame, Lane, LineSegment};
use anyhow::{bail, Result};
use opencv::{
    core::{self, Mat, Scalar},
    prelude::*,
};
use tracing::debug;

/// Per-frame output of the detection stages.
#[derive(Debug, Clone, Default)]
pub struct LaneDetection {
    /// Hough segments that survived the degenerate-slope filter.
    pub segments: Vec<LineSegment>,
    pub lanes: Vec<Lane>,
}

/// Runs the full detection chain on a BGR image.
pub fn detect_lane(bgr: &Mat, config: &Config) -> Result<LaneDetection> {
    let mask = color_mask::extract_color_mask(bgr, &config.color)?;
    let edges = edges::detect_edges(&mask, &config.edges)?;
    let cropped = edges::crop_top(&edges, config.roi.cut)?;

    let raw = segments::detect_segments(&cropped, &config.hough)?;
    let segments = segments::discard_degenerate(raw);

    let aggregator = LaneAggregator::new(bgr.cols(), bgr.rows(), config.lanes.boundary);
    let lanes = aggregator.aggregate(&segments);
    debug!("Lane lines: {:?}", lanes);

    Ok(LaneDetection { segments, lanes })
}

/// Copies a frame into a freshly allocated `CV_8UC3` matrix.
pub fn frame_to_mat(frame: &Frame) -> Result<Mat> {
    let expected = frame.width * frame.height * 3;
    if frame.data.len() != expected {
        bail!(
            "frame buffer holds {} bytes, expected {} for {}x{} BGR",
            frame.data.len(),
            expected,
            frame.width,
            frame.height
        );
    }

    let mut mat = Mat::new_rows_cols_with_default(
        frame.height as i32,
        frame.width as i32,
        core::CV_8UC3,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(&frame.data);
    Ok(mat)
}

pub fn mat_to_frame(mat: &Mat, timestamp_ms: f64) -> Result<Frame> {
    if mat.typ() != core::CV_8UC3 {
        bail!("expected an 8-bit 3-channel image, got type {}", mat.typ());
    }
    let data = if mat.is_continuous() {
        mat.data_bytes()?.to_vec()
    } else {
        mat.try_clone()?.data_bytes()?.to_vec()
    };

    Ok(Frame {
        data,
        width: mat.cols() as usize,
        height: mat.rows() as usize,
        timestamp_ms,
    })
}

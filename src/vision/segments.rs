// src/vision/segments.rs
//
// Probabilistic Hough segment extraction on the cropped edge map.

use crate::types::{HoughConfig, LineSegment};
use anyhow::Result;
use opencv::{
    core::{Mat, Vec4i, Vector},
    imgproc,
};
use tracing::{debug, info};

/// Raw Hough segments, in detection order.
pub fn detect_segments(edges: &Mat, config: &HoughConfig) -> Result<Vec<LineSegment>> {
    let mut lines = Vector::<Vec4i>::new();
    imgproc::hough_lines_p(
        edges,
        &mut lines,
        config.rho,
        config.theta_degrees.to_radians(),
        config.threshold,
        config.min_line_length,
        config.max_line_gap,
    )?;

    let segments: Vec<LineSegment> = lines
        .iter()
        .map(|l| LineSegment::new(l[0], l[1], l[2], l[3]))
        .collect();

    debug!("Hough produced {} segment(s)", segments.len());
    Ok(segments)
}

/// Drops segments whose slope is undefined (vertical) or zero (horizontal).
/// Neither can be extrapolated to a lane line.
pub fn discard_degenerate(segments: Vec<LineSegment>) -> Vec<LineSegment> {
    segments
        .into_iter()
        .filter(|seg| {
            if seg.is_vertical() {
                info!("Ignoring vertical segment {:?}, slope is infinite", seg);
                false
            } else if seg.is_horizontal() {
                info!("Ignoring horizontal segment {:?}, slope is zero", seg);
                false
            } else {
                true
            }
        })
        .collect()
}

// src/overlay.rs
//
// Diagnostic drawing. Nothing here feeds back into steering.

use crate::steering::STRAIGHT_ANGLE;
use crate::types::{Lane, LineSegment, OverlayConfig};
use anyhow::Result;
use opencv::{
    core::{self, Mat, Point, Scalar},
    imgproc,
    prelude::*,
};

/// Colors in BGR order for OpenCV.
pub mod colors {
    use opencv::core::Scalar;

    pub const HEADING_RED: Scalar = Scalar::new(0.0, 0.0, 255.0, 0.0);
    pub const LANE_GREEN: Scalar = Scalar::new(0.0, 255.0, 0.0, 0.0);
    pub const SEGMENT_YELLOW: Scalar = Scalar::new(0.0, 255.0, 255.0, 0.0);
}

/// Heading line from the bottom center up to mid-height, leaning with the angle.
/// Exactly 90° is vertical.
pub fn heading_line_endpoints(width: i32, height: i32, steering_angle: i32) -> LineSegment {
    let x1 = width / 2;
    let y1 = height;
    let y2 = height / 2;

    let x2 = if steering_angle == STRAIGHT_ANGLE {
        x1
    } else {
        let radians = (steering_angle as f64).to_radians();
        let x = (x1 as f64 - (height as f64 / 2.0) / radians.tan()).trunc();
        if x.is_finite() {
            x.clamp(-width as f64, 2.0 * width as f64) as i32
        } else {
            x1
        }
    };

    LineSegment::new(x1, y1, x2, y2)
}

/// Draws `lines` on a black layer and blends it over the frame.
pub fn display_lines(
    frame: &Mat,
    lines: &[LineSegment],
    color: Scalar,
    line_width: i32,
    config: &OverlayConfig,
) -> Result<Mat> {
    let mut layer = Mat::new_size_with_default(frame.size()?, frame.typ(), Scalar::all(0.0))?;
    for line in lines {
        imgproc::line(
            &mut layer,
            Point::new(line.x1, line.y1),
            Point::new(line.x2, line.y2),
            color,
            line_width,
            imgproc::LINE_8,
            0,
        )?;
    }

    let mut blended = Mat::default();
    core::add_weighted(frame, config.opacity, &layer, 1.0, 1.0, &mut blended, -1)?;
    Ok(blended)
}

pub fn display_lanes(frame: &Mat, lanes: &[Lane], config: &OverlayConfig) -> Result<Mat> {
    let segments: Vec<LineSegment> = lanes.iter().map(|l| l.segment).collect();
    display_lines(
        frame,
        &segments,
        colors::LANE_GREEN,
        config.lane_width,
        config,
    )
}

pub fn display_heading_line(frame: &Mat, steering_angle: i32, config: &OverlayConfig) -> Result<Mat> {
    let heading = heading_line_endpoints(frame.cols(), frame.rows(), steering_angle);
    display_lines(
        frame,
        &[heading],
        colors::HEADING_RED,
        config.heading_width,
        config,
    )
}

/// Raw segments, lane lines and the heading indicator: the frame shown while driving.
pub fn render_drive_overlay(
    frame: &Mat,
    segments: &[LineSegment],
    lanes: &[Lane],
    steering_angle: i32,
    config: &OverlayConfig,
) -> Result<Mat> {
    let mut output = frame.try_clone()?;
    if !segments.is_empty() {
        output = display_lines(&output, segments, colors::SEGMENT_YELLOW, 2, config)?;
    }
    if !lanes.is_empty() {
        output = display_lanes(&output, lanes, config)?;
    }
    display_heading_line(&output, steering_angle, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black(width: i32, height: i32) -> Mat {
        Mat::new_rows_cols_with_default(height, width, core::CV_8UC3, Scalar::all(0.0)).unwrap()
    }

    #[test]
    fn test_straight_heading_is_vertical() {
        let seg = heading_line_endpoints(320, 240, 90);
        assert_eq!(seg, LineSegment::new(160, 240, 160, 120));
    }

    #[test]
    fn test_heading_leans_with_angle() {
        let right = heading_line_endpoints(320, 240, 113);
        let left = heading_line_endpoints(320, 240, 67);
        assert!(right.x2 > 160, "{:?}", right);
        assert!(left.x2 < 160, "{:?}", left);
        assert!(((right.x2 - 160) - (160 - left.x2)).abs() <= 1);
    }

    #[test]
    fn test_degenerate_angle_stays_bounded() {
        let seg = heading_line_endpoints(320, 240, 0);
        assert!(seg.x2 >= -320 && seg.x2 <= 640);
    }

    #[test]
    fn test_heading_overlay_draws_red_center_column() {
        let frame = black(320, 240);
        let out = display_heading_line(&frame, 90, &OverlayConfig::default()).unwrap();

        assert_eq!(out.size().unwrap(), frame.size().unwrap());
        let px = out.at_2d::<core::Vec3b>(200, 160).unwrap();
        assert_eq!(px[2], 255);
        assert_eq!(px[1], 1);

        let background = out.at_2d::<core::Vec3b>(50, 20).unwrap();
        assert_eq!(background[2], 1);
    }

    #[test]
    fn test_lane_overlay_keeps_frame_size() {
        let frame = black(160, 120);
        let lanes = [Lane {
            side: crate::types::LaneSide::Left,
            segment: LineSegment::new(20, 120, 60, 60),
        }];
        let segments = [LineSegment::new(25, 110, 55, 70)];
        let out =
            render_drive_overlay(&frame, &segments, &lanes, 95, &OverlayConfig::default()).unwrap();
        assert_eq!(out.rows(), 120);
        assert_eq!(out.cols(), 160);
        assert_eq!(out.typ(), core::CV_8UC3);
    }
}

// src/vision/lane_aggregator.rs
//
// Groups Hough segments into at most one LEFT and one RIGHT lane line.
//
// Classification (y grows downwards):
//   slope < 0, both endpoints left of  width * (1 - boundary)  → LEFT
//   slope > 0, both endpoints right of width * boundary        → RIGHT
//
// With boundary = 1/3 the two assignment zones overlap on the middle third.
// Each side's (slope, intercept) pairs are averaged into one line that spans
// from the frame bottom to mid-height.

use crate::types::{Lane, LaneSide, LineSegment};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

/// Candidate fits collected for each side.
#[derive(Debug, Default)]
struct SideFits {
    left: Vec<LineFit>,
    right: Vec<LineFit>,
}

pub struct LaneAggregator {
    width: i32,
    height: i32,
    left_region_boundary: f64,
    right_region_boundary: f64,
}

impl LaneAggregator {
    pub fn new(width: i32, height: i32, boundary: f64) -> Self {
        Self {
            width,
            height,
            left_region_boundary: width as f64 * (1.0 - boundary),
            right_region_boundary: width as f64 * boundary,
        }
    }

    /// Assigns a side to a segment, or `None` when it belongs to neither zone.
    pub fn classify(&self, segment: &LineSegment) -> Option<(LaneSide, LineFit)> {
        let (slope, intercept) = segment.slope_intercept()?;
        let fit = LineFit { slope, intercept };

        if slope < 0.0 {
            let in_zone = (segment.x1 as f64) < self.left_region_boundary
                && (segment.x2 as f64) < self.left_region_boundary;
            in_zone.then_some((LaneSide::Left, fit))
        } else if slope > 0.0 {
            let in_zone = (segment.x1 as f64) > self.right_region_boundary
                && (segment.x2 as f64) > self.right_region_boundary;
            in_zone.then_some((LaneSide::Right, fit))
        } else {
            None
        }
    }

    /// Lanes for one frame: none, one or both sides, LEFT first.
    pub fn aggregate(&self, segments: &[LineSegment]) -> Vec<Lane> {
        let mut fits = SideFits::default();

        for segment in segments {
            match self.classify(segment) {
                Some((LaneSide::Left, fit)) => fits.left.push(fit),
                Some((LaneSide::Right, fit)) => fits.right.push(fit),
                None => {}
            }
        }

        let mut lanes = Vec::with_capacity(2);
        if let Some(avg) = average_fit(&fits.left) {
            lanes.push(Lane {
                side: LaneSide::Left,
                segment: self.make_points(avg),
            });
        }
        if let Some(avg) = average_fit(&fits.right) {
            lanes.push(Lane {
                side: LaneSide::Right,
                segment: self.make_points(avg),
            });
        }

        debug!(
            "Lane candidates: {} left, {} right -> {} lane(s)",
            fits.left.len(),
            fits.right.len(),
            lanes.len()
        );
        lanes
    }

    /// Extrapolates a fit from the frame bottom to mid-height.
    /// x is truncated and clamped to [-width, 2 * width].
    pub fn make_points(&self, fit: LineFit) -> LineSegment {
        let y1 = self.height;
        let y2 = self.height / 2;
        LineSegment::new(self.x_at(fit, y1), y1, self.x_at(fit, y2), y2)
    }

    fn x_at(&self, fit: LineFit, y: i32) -> i32 {
        let lo = -self.width as f64;
        let hi = 2.0 * self.width as f64;
        let x = ((y as f64 - fit.intercept) / fit.slope).trunc();
        if x.is_nan() {
            return 0;
        }
        x.clamp(lo, hi) as i32
    }
}

fn average_fit(fits: &[LineFit]) -> Option<LineFit> {
    if fits.is_empty() {
        return None;
    }
    let n = fits.len() as f64;
    Some(LineFit {
        slope: fits.iter().map(|f| f.slope).sum::<f64>() / n,
        intercept: fits.iter().map(|f| f.intercept).sum::<f64>() / n,
    })
}

// src/vision/edges.rs
//
// Edge extraction on the color mask and the region-of-interest crop.

use crate::types::EdgeConfig;
use anyhow::{bail, Result};
use opencv::{
    core::{self, Mat, Point, Scalar, Vector},
    imgproc,
    prelude::*,
};

const CANNY_APERTURE: i32 = 3;

/// Two-threshold Canny edges of a binary mask.
pub fn detect_edges(mask: &Mat, config: &EdgeConfig) -> Result<Mat> {
    let mut edges = Mat::default();
    imgproc::canny(
        mask,
        &mut edges,
        config.low_threshold,
        config.high_threshold,
        CANNY_APERTURE,
        false,
    )?;
    Ok(edges)
}

/// Zeroes every pixel above `height * cut`, keeping the lower part of the frame.
pub fn crop_top(edges: &Mat, cut: f64) -> Result<Mat> {
    if !(cut > 0.0 && cut < 1.0) {
        bail!("crop fraction must lie in (0, 1), got {}", cut);
    }

    let width = edges.cols();
    let height = edges.rows();
    let top = (height as f64 * cut) as i32;

    let mut roi = Mat::new_rows_cols_with_default(height, width, edges.typ(), Scalar::all(0.0))?;

    let mut polygon = Vector::<Vector<Point>>::new();
    polygon.push(Vector::from_iter([
        Point::new(0, top),
        Point::new(width, top),
        Point::new(width, height),
        Point::new(0, height),
    ]));
    imgproc::fill_poly(
        &mut roi,
        &polygon,
        Scalar::all(255.0),
        imgproc::LINE_8,
        0,
        Point::new(0, 0),
    )?;

    let mut cropped = Mat::default();
    core::bitwise_and(edges, &roi, &mut cropped, &core::no_array())?;
    Ok(cropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_mask(width: i32, height: i32) -> Mat {
        Mat::new_rows_cols_with_default(height, width, core::CV_8UC1, Scalar::all(255.0)).unwrap()
    }

    #[test]
    fn test_crop_keeps_lower_part() {
        let mask = filled_mask(30, 40);
        let cropped = crop_top(&mask, 0.25).unwrap();

        assert_eq!(*cropped.at_2d::<u8>(0, 15).unwrap(), 0);
        assert_eq!(*cropped.at_2d::<u8>(9, 15).unwrap(), 0);
        assert_eq!(*cropped.at_2d::<u8>(10, 15).unwrap(), 255);
        assert_eq!(*cropped.at_2d::<u8>(39, 0).unwrap(), 255);
        assert_eq!(*cropped.at_2d::<u8>(39, 29).unwrap(), 255);
    }

    #[test]
    fn test_crop_never_touches_columns() {
        let mask = filled_mask(40, 20);
        let cropped = crop_top(&mask, 0.5).unwrap();
        for x in 0..40 {
            assert_eq!(*cropped.at_2d::<u8>(15, x).unwrap(), 255);
        }
    }

    #[test]
    fn test_crop_rejects_invalid_fraction() {
        let mask = filled_mask(10, 10);
        assert!(crop_top(&mask, 0.0).is_err());
        assert!(crop_top(&mask, 1.2).is_err());
    }

    #[test]
    fn test_empty_mask_has_no_edges() {
        let mask = Mat::new_rows_cols_with_default(20, 20, core::CV_8UC1, Scalar::all(0.0)).unwrap();
        let edges = detect_edges(&mask, &EdgeConfig::default()).unwrap();
        assert_eq!(core::count_non_zero(&edges).unwrap(), 0);
    }

    #[test]
    fn test_block_boundary_produces_edges() {
        let mut mask =
            Mat::new_rows_cols_with_default(40, 40, core::CV_8UC1, Scalar::all(0.0)).unwrap();
        imgproc::rectangle(
            &mut mask,
            core::Rect::new(10, 10, 20, 20),
            Scalar::all(255.0),
            -1,
            imgproc::LINE_8,
            0,
        )
        .unwrap();
        let edges = detect_edges(&mask, &EdgeConfig::default()).unwrap();
        assert!(core::count_non_zero(&edges).unwrap() > 0);
        assert_eq!(*edges.at_2d::<u8>(20, 20).unwrap(), 0);
    }
}

// src/vision/color_mask.rs
//
// Track-marking isolation by HSV band.

use crate::types::ColorConfig;
use anyhow::Result;
use opencv::{
    core::{self, Mat, Scalar},
    imgproc,
};

fn band_scalar(channels: [u8; 3]) -> Scalar {
    Scalar::new(
        channels[0] as f64,
        channels[1] as f64,
        channels[2] as f64,
        0.0,
    )
}

/// Binary mask (0 / 255) of the pixels of a BGR frame inside the HSV band.
///
/// A frame without matching pixels yields an all-zero mask.
pub fn extract_color_mask(bgr: &Mat, band: &ColorConfig) -> Result<Mat> {
    let mut hsv = Mat::default();
    imgproc::cvt_color(bgr, &mut hsv, imgproc::COLOR_BGR2HSV, 0)?;

    let mut mask = Mat::default();
    core::in_range(
        &hsv,
        &band_scalar(band.lower),
        &band_scalar(band.upper),
        &mut mask,
    )?;
    Ok(mask)
}

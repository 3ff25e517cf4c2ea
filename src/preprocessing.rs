// src/preprocessing.rs

use crate::types::Frame;
use crate::vision::frame_to_mat;
use anyhow::{bail, Result};
use opencv::{
    core::{Mat, Rect, Size},
    imgproc,
    prelude::*,
};

/// Model input for the steering network: lower half of the BGR frame,
/// resized to `dst_width`x`dst_height`, RGB, scaled to [0, 1], NHWC order.
pub fn preprocess(frame: &Frame, dst_width: usize, dst_height: usize) -> Result<Vec<f32>> {
    if frame.width == 0 || frame.height < 2 {
        bail!(
            "invalid frame for preprocessing: {}x{}",
            frame.width,
            frame.height
        );
    }
    let bgr = frame_to_mat(frame)?;

    // Keep the road, drop the horizon
    let top = bgr.rows() / 2;
    let road = Mat::roi(&bgr, Rect::new(0, top, bgr.cols(), bgr.rows() - top))?.try_clone()?;

    let mut resized = Mat::default();
    imgproc::resize(
        &road,
        &mut resized,
        Size::new(dst_width as i32, dst_height as i32),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    let mut rgb = Mat::default();
    imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

    Ok(rgb.data_bytes()?.iter().map(|v| *v as f32 / 255.0).collect())
}

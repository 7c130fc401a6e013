//! Frame preprocessing
//!
//! Resize to the model resolution and normalize to [0, 1] floats in NHWC
//! layout, matching the checkpoint's training-time preprocessing.

use std::path::Path;

use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;

use crate::logic::error::ModerationError;

/// Decode an image file to RGB.
pub fn load_rgb(path: &Path) -> Result<RgbImage, ModerationError> {
    let img = image::open(path)
        .map_err(|e| ModerationError::decode(format!("{}: {}", path.display(), e)))?;
    Ok(img.to_rgb8())
}

/// Resize and normalize one frame into a flat HWC float buffer.
pub fn to_model_input(image: &RgbImage, size: u32) -> Vec<f32> {
    let resized = image::imageops::resize(image, size, size, FilterType::Triangle);

    let mut data = Vec::with_capacity((size * size * 3) as usize);
    for pixel in resized.pixels() {
        data.push(pixel.0[0] as f32 / 255.0);
        data.push(pixel.0[1] as f32 / 255.0);
        data.push(pixel.0[2] as f32 / 255.0);
    }
    data
}

/// Stack prepared frames into an NHWC batch tensor.
pub fn batch_tensor<T: AsRef<[f32]>>(
    frames: &[T],
    size: u32,
) -> Result<Array4<f32>, ModerationError> {
    let batch = frames.len();
    let mut data = Vec::with_capacity(batch * (size * size * 3) as usize);
    for frame in frames {
        data.extend_from_slice(frame.as_ref());
    }

    Array4::from_shape_vec((batch, size as usize, size as usize, 3), data)
        .map_err(|e| ModerationError::engine(format!("batch tensor shape error: {}", e)))
}

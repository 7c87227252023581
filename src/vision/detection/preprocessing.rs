// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Letterbox preprocessing for the YOLO detector

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ndarray::Array4;

/// Gray fill used for the letterbox border
pub const PAD_VALUE: u8 = 114;

/// A letterboxed image plus the geometry needed to undo it
#[derive(Debug, Clone)]
pub struct Letterbox {
    /// Square canvas of `size` x `size` pixels
    pub image: RgbImage,
    /// Canvas edge in pixels
    pub size: u32,
    /// Resize factor applied to the original image
    pub scale: f32,
    /// Left border width
    pub pad_left: u32,
    /// Top border height
    pub pad_top: u32,
    /// Original image width
    pub original_width: u32,
    /// Original image height
    pub original_height: u32,
}

/// Resize with aspect ratio preserved and center on a gray square canvas
///
/// The resized image is `round(w * r) x round(h * r)` with
/// `r = min(size / w, size / h)`. Odd leftover padding puts the extra pixel
/// on the bottom/right edge.
pub fn letterbox(image: &RgbImage, size: u32) -> Letterbox {
    let (orig_w, orig_h) = image.dimensions();
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));

    if orig_w == 0 || orig_h == 0 || size == 0 {
        return Letterbox {
            image: canvas,
            size,
            scale: 1.0,
            pad_left: 0,
            pad_top: 0,
            original_width: orig_w,
            original_height: orig_h,
        };
    }

    let scale = (size as f32 / orig_w as f32).min(size as f32 / orig_h as f32);

    let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, size);

    let dw = (size - new_w) as f32 / 2.0;
    let dh = (size - new_h) as f32 / 2.0;
    let pad_left = (dw - 0.1).round().max(0.0) as u32;
    let pad_top = (dh - 0.1).round().max(0.0) as u32;

    if (new_w, new_h) == (orig_w, orig_h) {
        imageops::replace(&mut canvas, image, pad_left as i64, pad_top as i64);
    } else {
        let resized = imageops::resize(image, new_w, new_h, FilterType::Triangle);
        imageops::replace(&mut canvas, &resized, pad_left as i64, pad_top as i64);
    }

    Letterbox {
        image: canvas,
        size,
        scale,
        pad_left,
        pad_top,
        original_width: orig_w,
        original_height: orig_h,
    }
}

impl Letterbox {
    /// NCHW `f32` tensor with channels scaled to [0, 1]
    pub fn to_tensor(&self) -> Array4<f32> {
        let size = self.size as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

        for (x, y, pixel) in self.image.enumerate_pixels() {
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
            }
        }

        tensor
    }

    /// NCHW `u8` tensor for models with an integer input
    pub fn to_u8_tensor(&self) -> Array4<u8> {
        let size = self.size as usize;
        let mut tensor = Array4::<u8>::zeros((1, 3, size, size));

        for (x, y, pixel) in self.image.enumerate_pixels() {
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] = pixel[c];
            }
        }

        tensor
    }

    /// Map a letterbox-space box back to original image space, clipped
    pub fn map_to_original(&self, xyxy: [f32; 4]) -> [f32; 4] {
        let w = self.original_width as f32;
        let h = self.original_height as f32;
        let px = self.pad_left as f32;
        let py = self.pad_top as f32;

        [
            ((xyxy[0] - px) / self.scale).clamp(0.0, w),
            ((xyxy[1] - py) / self.scale).clamp(0.0, h),
            ((xyxy[2] - px) / self.scale).clamp(0.0, w),
            ((xyxy[3] - py) / self.scale).clamp(0.0, h),
        ]
    }
}

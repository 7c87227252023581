// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Payload decoding for detection requests
//!
//! Turns the base64 `image` field of a request into an RGB pixel buffer.
//! No size limit is applied here: a payload either decodes or it does not.

use base64::{
    alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use image::{ImageFormat, RgbImage};
use thiserror::Error;

/// Standard alphabet with canonical padding, but non-zero trailing bits in
/// the last symbol are ignored instead of rejected
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Errors raised while turning a request payload into pixels
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Image data is empty")]
    EmptyData,

    #[error("Cannot identify image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),
}

/// Metadata captured while decoding
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Format sniffed from the leading bytes
    pub format: ImageFormat,
    /// Size of the encoded image in bytes
    pub size_bytes: usize,
}

/// Decode a base64 payload into raw bytes
///
/// ASCII whitespace is skipped so that line-wrapped encoders (MIME style,
/// 76 columns) are accepted. Stray bits after the last full byte are
/// discarded, so `"QR=="` decodes to `b"A"`.
pub fn decode_base64(base64_str: &str) -> Result<Vec<u8>, ImageError> {
    let bytes = if base64_str.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = base64_str
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        PAYLOAD_ENGINE.decode(compact)?
    } else {
        PAYLOAD_ENGINE.decode(base64_str)?
    };

    Ok(bytes)
}

/// Decode encoded image bytes into a 3-channel RGB buffer
///
/// Any color type the `image` crate understands is accepted. Alpha is
/// dropped, grayscale is expanded, 16-bit channels are scaled to 8-bit.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(RgbImage, ImageInfo), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let format = image::guess_format(bytes).map_err(|_| ImageError::UnsupportedFormat)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img.to_rgb8(), info))
}

/// Decode a base64-encoded image straight to RGB
///
/// # Example
/// ```ignore
/// let (rgb, info) = decode_base64_image("iVBORw0KGgo...")?;
/// println!("Image size: {}x{}", info.width, info.height);
/// ```
pub fn decode_base64_image(base64_str: &str) -> Result<(RgbImage, ImageInfo), ImageError> {
    let bytes = decode_base64(base64_str)?;
    decode_image_bytes(&bytes)
}

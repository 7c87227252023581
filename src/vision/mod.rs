// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for the detection endpoint
//!
//! This module provides:
//! - Payload decoding (base64 → encoded bytes → RGB pixels)
//! - Plate detection via an int8-quantized YOLO model on ONNX Runtime
//!
//! Inference runs on CPU only.

pub mod detection;
pub mod image_utils;

pub use detection::{DetectedBox, DetectionResult, Detector, PredictParams, YoloOnnxDetector};
pub use image_utils::{decode_base64, decode_base64_image, decode_image_bytes, ImageError, ImageInfo};

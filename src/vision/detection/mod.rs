// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection for licence-plate localisation
//!
//! Components:
//! - `detector` - The `Detector` contract and its result types
//! - `preprocessing` - Letterbox resize into the model's square input
//! - `postprocess` - YOLO output decoding, NMS and mapping back to image space
//! - `model` - ONNX Runtime backed YOLO detector

pub mod detector;
pub mod model;
pub mod postprocess;
pub mod preprocessing;

pub use detector::{DetectedBox, DetectionResult, Detector, PredictParams};
pub use model::YoloOnnxDetector;
pub use preprocessing::{letterbox, Letterbox, PAD_VALUE};

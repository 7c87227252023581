// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detector contract shared by the HTTP layer and model backends

use anyhow::Result;
use image::RgbImage;

/// Square input edge the plate model was exported with
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Minimum class score for a candidate to survive
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// IoU above which a lower-scored box of the same class is suppressed
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;

/// Upper bound on boxes returned per image
pub const DEFAULT_MAX_DETECTIONS: usize = 300;

/// Per-call inference settings
#[derive(Debug, Clone, PartialEq)]
pub struct PredictParams {
    /// Letterbox target edge in pixels
    pub image_size: u32,
    /// Confidence threshold (0.0-1.0)
    pub confidence_threshold: f32,
    /// NMS IoU threshold (0.0-1.0)
    pub iou_threshold: f32,
    /// Maximum boxes kept after NMS
    pub max_detections: usize,
    /// Use the 8-bit integer input path when the model offers one
    pub quantized: bool,
}

impl Default for PredictParams {
    fn default() -> Self {
        Self {
            image_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
            quantized: true,
        }
    }
}

/// One detected object in original image coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedBox {
    /// Corners as [x1, y1, x2, y2]
    pub xyxy: [f32; 4],
    /// Detection confidence score (0.0-1.0)
    pub confidence: f32,
    /// Index of the winning class
    pub class_id: usize,
}

impl DetectedBox {
    pub fn new(xyxy: [f32; 4], confidence: f32, class_id: usize) -> Self {
        Self {
            xyxy,
            confidence,
            class_id,
        }
    }

    /// Corners truncated toward zero
    ///
    /// Fractional precision is dropped, never rounded: 10.7 becomes 10.
    pub fn truncated(&self) -> [i32; 4] {
        [
            self.xyxy[0] as i32,
            self.xyxy[1] as i32,
            self.xyxy[2] as i32,
            self.xyxy[3] as i32,
        ]
    }

    pub fn width(&self) -> f32 {
        self.xyxy[2] - self.xyxy[0]
    }

    pub fn height(&self) -> f32 {
        self.xyxy[3] - self.xyxy[1]
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }
}

/// Output of one detector pass, boxes in detector order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    pub boxes: Vec<DetectedBox>,
}

impl DetectionResult {
    pub fn new(boxes: Vec<DetectedBox>) -> Self {
        Self { boxes }
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }
}

/// A loaded object detector
///
/// Implementations are loaded once at startup and shared read-only between
/// requests; any internal mutable state must be synchronised by the
/// implementation itself.
#[cfg_attr(test, mockall::automock)]
pub trait Detector: Send + Sync {
    /// Run detection over an RGB image
    ///
    /// Returns one or more result objects; the caller preserves both the
    /// result order and the box order inside each result.
    fn predict(&self, image: &RgbImage, params: &PredictParams) -> Result<Vec<DetectionResult>>;

    /// Short model identifier for logs and health reports
    fn name(&self) -> String;
}

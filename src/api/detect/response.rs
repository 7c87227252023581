// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect response types

use serde::{Deserialize, Serialize};

use crate::vision::DetectionResult;

/// Successful detection response
///
/// Only box corners are returned; confidences and class ids stay internal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectResponse {
    pub success: bool,
    /// `[x1, y1, x2, y2]` per box, truncated to integer pixels
    pub boxes: Vec<[i32; 4]>,
}

impl DetectResponse {
    pub fn new(boxes: Vec<[i32; 4]>) -> Self {
        Self {
            success: true,
            boxes,
        }
    }

    /// Flatten detector results, keeping result order then box order
    pub fn from_results(results: &[DetectionResult]) -> Self {
        let boxes = results
            .iter()
            .flat_map(|result| result.boxes.iter().map(|b| b.truncated()))
            .collect();

        Self::new(boxes)
    }
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO output decoding and non-maximum suppression
//!
//! The raw head output is a `[1, 4 + nc, anchors]` tensor (or its transpose).
//! Each anchor holds `cx, cy, w, h` in letterbox pixels followed by one score
//! per class.

use anyhow::Result;
use ndarray::{ArrayView2, ArrayViewD};
use std::cmp::Ordering;
use tracing::debug;

use super::detector::{DetectedBox, DetectionResult, PredictParams};
use super::preprocessing::Letterbox;

/// Decode raw head output into candidate boxes in letterbox space
///
/// Candidates whose best class score does not exceed `confidence_threshold`
/// are dropped. Boxes are returned as `[x1, y1, x2, y2]`.
pub fn decode_predictions(
    output: ArrayViewD<f32>,
    confidence_threshold: f32,
) -> Result<Vec<DetectedBox>> {
    let shape = output.shape().to_vec();

    let table = match shape.as_slice() {
        [1, a, b] | [a, b] => {
            let view = output
                .into_shape_with_order((*a, *b))
                .map_err(|e| anyhow::anyhow!("Cannot reshape detection output {:?}: {}", shape, e))?;
            // Anchors always outnumber features, so the short axis is features
            if a < b {
                view.reversed_axes()
            } else {
                view
            }
        }
        _ => anyhow::bail!(
            "Unexpected detection output shape: {:?}, expected [1, 4+nc, N] or [1, N, 4+nc]",
            shape
        ),
    };

    decode_rows(table, confidence_threshold)
}

fn decode_rows(table: ArrayView2<f32>, confidence_threshold: f32) -> Result<Vec<DetectedBox>> {
    let features = table.ncols();
    if features < 5 {
        anyhow::bail!(
            "Detection output has {} features per anchor, expected at least 5",
            features
        );
    }

    let mut candidates = Vec::new();

    for row in table.rows() {
        let (class_id, score) = row
            .iter()
            .skip(4)
            .enumerate()
            .fold((0usize, f32::NEG_INFINITY), |(best_idx, best), (idx, &s)| {
                if s > best {
                    (idx, s)
                } else {
                    (best_idx, best)
                }
            });

        if !score.is_finite() || score <= confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        if !(cx.is_finite() && cy.is_finite() && w.is_finite() && h.is_finite()) {
            continue;
        }

        candidates.push(DetectedBox::new(
            [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            score,
            class_id,
        ));
    }

    Ok(candidates)
}

/// Intersection over union of two boxes
pub fn iou(a: &DetectedBox, b: &DetectedBox) -> f32 {
    let overlap = DetectedBox::new(
        [
            a.xyxy[0].max(b.xyxy[0]),
            a.xyxy[1].max(b.xyxy[1]),
            a.xyxy[2].min(b.xyxy[2]),
            a.xyxy[3].min(b.xyxy[3]),
        ],
        0.0,
        a.class_id,
    );
    let inter = overlap.area();
    let union = a.area() + b.area() - inter;

    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Greedy per-class NMS
///
/// Output is ordered by descending confidence and holds at most
/// `max_detections` boxes. Boxes of different classes never suppress each
/// other.
pub fn non_max_suppression(
    mut candidates: Vec<DetectedBox>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<DetectedBox> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<DetectedBox> = Vec::with_capacity(candidates.len().min(max_detections));

    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }

        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && iou(k, &candidate) > iou_threshold
        });

        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}

/// Full postprocessing for one image: decode, NMS, map to original pixels
pub fn postprocess(
    output: ArrayViewD<f32>,
    letterbox: &Letterbox,
    params: &PredictParams,
) -> Result<DetectionResult> {
    let candidates = decode_predictions(output, params.confidence_threshold)?;
    let candidate_count = candidates.len();

    let boxes: Vec<DetectedBox> =
        non_max_suppression(candidates, params.iou_threshold, params.max_detections)
            .into_iter()
            .map(|b| DetectedBox {
                xyxy: letterbox.map_to_original(b.xyxy),
                ..b
            })
            .collect();

    debug!(
        "Postprocess kept {} of {} candidates",
        boxes.len(),
        candidate_count
    );

    Ok(DetectionResult::new(boxes))
}

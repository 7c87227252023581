// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Detect endpoint tests for POST /detect
//!
//! These tests drive the router with fake detectors and verify that:
//! - Successful detections return `{"success": true, "boxes": [...]}`
//! - Coordinates are truncated, never rounded
//! - Detector ordering reaches the client untouched
//! - Every failure is a 500 with `{"success": false, "error": ...}`

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
};
use anpr_detect_node::{
    api::http_server::{create_app, AppState},
    vision::{DetectedBox, DetectionResult, Detector, PredictParams},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageBuffer, ImageFormat, RgbImage, Rgb};
use serde_json::Value;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

/// Detector that always answers with the same boxes
struct FixedDetector {
    boxes: Vec<[f32; 4]>,
    calls: AtomicUsize,
}

impl FixedDetector {
    fn new(boxes: Vec<[f32; 4]>) -> Self {
        Self {
            boxes,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Detector for FixedDetector {
    fn predict(&self, _image: &RgbImage, _params: &PredictParams) -> Result<Vec<DetectionResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let boxes = self
            .boxes
            .iter()
            .map(|xyxy| DetectedBox::new(*xyxy, 0.9, 0))
            .collect();
        Ok(vec![DetectionResult::new(boxes)])
    }

    fn name(&self) -> String {
        "fixed".to_string()
    }
}

/// Detector that always fails
struct FailingDetector;

impl Detector for FailingDetector {
    fn predict(&self, _image: &RgbImage, _params: &PredictParams) -> Result<Vec<DetectionResult>> {
        Err(anyhow::anyhow!("model exploded"))
    }

    fn name(&self) -> String {
        "failing".to_string()
    }
}

/// Detector that records the image size it was handed
struct SizeProbe;

impl Detector for SizeProbe {
    fn predict(&self, image: &RgbImage, _params: &PredictParams) -> Result<Vec<DetectionResult>> {
        let (w, h) = (image.width() as f32, image.height() as f32);
        Ok(vec![DetectionResult::new(vec![DetectedBox::new(
            [0.0, 0.0, w, h],
            1.0,
            0,
        )])])
    }

    fn name(&self) -> String {
        "probe".to_string()
    }
}

fn encode_image(width: u32, height: u32, format: ImageFormat) -> String {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128u8]));

    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format).unwrap();
    STANDARD.encode(buffer.into_inner())
}

fn state_with(detector: impl Detector + 'static) -> AppState {
    AppState::new(Arc::new(detector), PredictParams::default())
}

async fn post_detect(state: AppState, body: impl Into<Body>) -> (StatusCode, Value) {
    let app = create_app(state, None);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/detect")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

fn assert_failure(status: StatusCode, json: &Value) {
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    let error = json["error"].as_str().expect("error should be a string");
    assert!(!error.is_empty());
    assert!(json.get("boxes").is_none());
}

#[cfg(test)]
mod detect_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_no_detections_returns_empty_boxes() {
        let body = serde_json::json!({ "image": encode_image(64, 48, ImageFormat::Png) });
        let (status, json) =
            post_detect(state_with(FixedDetector::new(vec![])), body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({ "success": true, "boxes": [] }));
    }

    #[tokio::test]
    async fn test_coordinates_are_truncated() {
        let detector = FixedDetector::new(vec![[10.7, 20.2, 30.9, 40.1]]);
        let body = serde_json::json!({ "image": encode_image(64, 64, ImageFormat::Png) });
        let (status, json) = post_detect(state_with(detector), body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!({ "success": true, "boxes": [[10, 20, 30, 40]] })
        );
    }

    #[tokio::test]
    async fn test_detector_order_is_preserved() {
        let detector = FixedDetector::new(vec![
            [50.0, 50.0, 60.0, 60.0],
            [1.0, 1.0, 2.0, 2.0],
            [50.0, 50.0, 60.0, 60.0],
        ]);
        let body = serde_json::json!({ "image": encode_image(64, 64, ImageFormat::Png) });
        let (_, json) = post_detect(state_with(detector), body.to_string()).await;

        assert_eq!(
            json["boxes"],
            serde_json::json!([[50, 50, 60, 60], [1, 1, 2, 2], [50, 50, 60, 60]])
        );
    }

    #[tokio::test]
    async fn test_jpeg_payload_is_decoded() {
        let body = serde_json::json!({ "image": encode_image(40, 30, ImageFormat::Jpeg) });
        let (status, json) = post_detect(state_with(SizeProbe), body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["boxes"], serde_json::json!([[0, 0, 40, 30]]));
    }

    #[tokio::test]
    async fn test_missing_image_field() {
        let detector = Arc::new(FixedDetector::new(vec![[1.0, 1.0, 2.0, 2.0]]));
        let state = AppState::new(detector.clone(), PredictParams::default());
        let (status, json) = post_detect(state, r#"{"picture": "abc"}"#).await;

        assert_failure(status, &json);
        assert!(json["error"].as_str().unwrap().contains("image"));
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_base64() {
        let (status, json) = post_detect(
            state_with(FixedDetector::new(vec![])),
            r#"{"image": "***not base64***"}"#,
        )
        .await;

        assert_failure(status, &json);
    }

    #[tokio::test]
    async fn test_non_image_bytes() {
        let payload = STANDARD.encode(b"this is plain text, not an image");
        let body = serde_json::json!({ "image": payload });
        let (status, json) =
            post_detect(state_with(FixedDetector::new(vec![])), body.to_string()).await;

        assert_failure(status, &json);
    }

    #[tokio::test]
    async fn test_malformed_json_is_500() {
        let (status, json) =
            post_detect(state_with(FixedDetector::new(vec![])), "{not json").await;

        assert_failure(status, &json);
    }

    #[tokio::test]
    async fn test_empty_body_is_500() {
        let (status, json) = post_detect(state_with(FixedDetector::new(vec![])), "").await;

        assert_failure(status, &json);
    }

    #[tokio::test]
    async fn test_detector_error_is_reported() {
        let body = serde_json::json!({ "image": encode_image(16, 16, ImageFormat::Png) });
        let (status, json) = post_detect(state_with(FailingDetector), body.to_string()).await;

        assert_failure(status, &json);
        assert_eq!(json["error"], "model exploded");
    }

    #[tokio::test]
    async fn test_content_type_is_not_required() {
        let body = serde_json::json!({ "image": encode_image(16, 16, ImageFormat::Png) });

        for content_type in [None, Some("text/plain"), Some("application/octet-stream")] {
            let app = create_app(state_with(FixedDetector::new(vec![[1.0, 2.0, 3.0, 4.0]])), None);
            let mut builder = Request::builder().method(Method::POST).uri("/detect");
            if let Some(ct) = content_type {
                builder = builder.header("content-type", ct);
            }
            let request = builder.body(Body::from(body.to_string())).unwrap();

            let response = app.oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "content-type {:?}", content_type);

            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(json["boxes"], serde_json::json!([[1, 2, 3, 4]]));
        }
    }

    #[tokio::test]
    async fn test_large_body_accepted_without_limit() {
        // ~3 MB of base64, well above axum's 2 MB default limit
        let body = serde_json::json!({ "image": encode_image(1024, 1024, ImageFormat::Bmp) });
        let (status, _) = post_detect(state_with(FixedDetector::new(vec![])), body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
    }
}

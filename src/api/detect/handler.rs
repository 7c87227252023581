// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect endpoint handler

use axum::{body::Bytes, extract::rejection::BytesRejection, extract::State, Json};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::request::DetectRequest;
use super::response::DetectResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::{decode_base64_image, DetectionResult, Detector, PredictParams};

/// POST /detect - Locate licence plates in an image
///
/// # Request
/// - `image`: Base64-encoded image data (required)
///
/// # Response
/// - `success`: always `true`
/// - `boxes`: `[x1, y1, x2, y2]` per plate, truncated to integer pixels
///
/// # Errors
/// Every failure (malformed body, missing `image`, bad base64, undecodable
/// image, inference error) is answered with 500 and
/// `{"success": false, "error": "<message>"}`.
pub async fn detect_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<DetectResponse>, ApiError> {
    info!("Processing image...");
    let started = Instant::now();

    let result = match body {
        Ok(body) => handle(state, &body).await,
        // Oversized or unreadable bodies get the same envelope
        Err(rejection) => Err(ApiError::InvalidRequest(rejection.body_text())),
    };

    match &result {
        Ok(response) => {
            info!("Detection completed.");
            debug!(
                "Returning {} boxes in {}ms: {:?}",
                response.boxes.len(),
                started.elapsed().as_millis(),
                response.boxes
            );
        }
        Err(e) => warn!("Detection failed ({}): {}", e.kind(), e),
    }

    result.map(Json)
}

async fn handle(state: AppState, body: &[u8]) -> Result<DetectResponse, ApiError> {
    let request = DetectRequest::from_slice(body)?;

    // Decoding and inference are CPU bound
    let results = tokio::task::spawn_blocking(move || {
        run_detection(state.detector.as_ref(), &request.image, &state.params)
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("Detection task failed: {}", e)))??;

    Ok(DetectResponse::from_results(&results))
}

/// Decode a base64 image and run the detector on it
pub fn run_detection(
    detector: &dyn Detector,
    image_b64: &str,
    params: &PredictParams,
) -> Result<Vec<DetectionResult>, ApiError> {
    let (image, info) = decode_base64_image(image_b64)?;

    debug!(
        "Decoded image: {}x{} {:?}, {} bytes",
        info.width, info.height, info.format, info.size_bytes
    );

    detector
        .predict(&image, params)
        .map_err(|e| ApiError::InferenceFailed(format!("{:#}", e)))
}

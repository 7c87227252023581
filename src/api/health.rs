// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GET /health

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::http_server::AppState;
use crate::version::{FEATURES, VERSION, VERSION_NUMBER};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    /// Loaded detector name
    pub model: String,
    pub version: String,
    /// Full build tag
    pub build: String,
    pub features: Vec<String>,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub quantized: bool,
}

impl HealthResponse {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            status: "ok".to_string(),
            model: state.detector.name(),
            version: VERSION_NUMBER.to_string(),
            build: VERSION.to_string(),
            features: FEATURES.iter().map(|f| f.to_string()).collect(),
            input_size: state.params.image_size,
            confidence_threshold: state.params.confidence_threshold,
            quantized: state.params.quantized,
        }
    }
}

/// Liveness report; never runs the detector
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::from_state(&state))
}

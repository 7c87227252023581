// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request failure taxonomy for the detection API
//!
//! Every failure, whatever its kind, is reported as HTTP 500 with the
//! `{"success": false, "error": "<message>"}` envelope. The variants only
//! exist to keep messages and logs precise.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vision::ImageError;

/// Error envelope returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Body is not JSON, or lacks a string `image` field
    #[error("{0}")]
    InvalidRequest(String),

    /// Payload is not base64 or not a decodable image
    #[error(transparent)]
    InvalidImage(#[from] ImageError),

    /// The detector itself failed
    #[error("{0}")]
    InferenceFailed(String),

    /// The blocking worker running the detector did not complete
    #[error("{0}")]
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            success: false,
            error: self.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Short kind label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::InvalidImage(_) => "invalid_image",
            ApiError::InferenceFailed(_) => "inference_failed",
            ApiError::InternalError(_) => "internal_error",
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect request types

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;

/// Request for plate detection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectRequest {
    /// Base64-encoded image data (PNG, JPEG, ...)
    pub image: String,
}

impl DetectRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
        }
    }

    /// Parse a raw request body
    ///
    /// The body is parsed here instead of through the `Json` extractor so
    /// that malformed JSON and a missing `image` field surface as the same
    /// 500 envelope as every other failure.
    pub fn from_slice(body: &[u8]) -> Result<Self, ApiError> {
        Ok(serde_json::from_slice(body)?)
    }
}

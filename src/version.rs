// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the ANPR Detection Node

/// Full version string with feature description
pub const VERSION: &str = "v1.0.0-plate-detection-2025-11-03";

/// Semantic version number
pub const VERSION_NUMBER: &str = "1.0.0";

/// Build date
pub const BUILD_DATE: &str = "2025-11-03";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "plate-detection",
    "yolo-onnx",
    "int8-quantized",
    "letterbox-640",
    "health-endpoint",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("ANPR Detection Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}
